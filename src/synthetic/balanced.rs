//! Class-balanced and plain random subsampling

use crate::error::{MinerError, Result};
use crate::synthetic::{class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

fn validate_fraction(fraction: f64) -> Result<()> {
    if fraction > 0.0 && fraction <= 1.0 {
        Ok(())
    } else {
        Err(MinerError::ValidationError(format!(
            "subsample fraction must be in (0, 1], got {}",
            fraction
        )))
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn take_rows(x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> ResampleResult {
    ResampleResult {
        x: x.select(Axis(0), indices),
        y: y.select(Axis(0), indices),
        indices: indices.to_vec(),
    }
}

/// Draws the same number of rows from every class.
///
/// The per-class count is the minority class size, scaled down by the
/// subsample fraction when it is below 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancedSubsampler {
    /// Fraction of the minority class size to keep per class
    subsample_size: f64,
    /// Random seed
    seed: Option<u64>,
}

impl BalancedSubsampler {
    /// Create a subsampler keeping the full minority class size
    pub fn new() -> Self {
        Self {
            subsample_size: 1.0,
            seed: None,
        }
    }

    /// Set the subsample fraction
    pub fn with_subsample_size(mut self, fraction: f64) -> Self {
        self.subsample_size = fraction;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of rows kept per class for the given labels
    pub fn rows_per_class(&self, y: &Array1<f64>) -> Result<usize> {
        validate_fraction(self.subsample_size)?;
        let min_count = class_indices(y)
            .values()
            .map(Vec::len)
            .min()
            .ok_or_else(|| MinerError::ValidationError("cannot subsample an empty dataset".to_string()))?;

        let use_elems = if self.subsample_size < 1.0 {
            (min_count as f64 * self.subsample_size) as usize
        } else {
            min_count
        };

        if use_elems == 0 {
            return Err(MinerError::ValidationError(format!(
                "subsample fraction {} of minority class size {} keeps no rows",
                self.subsample_size, min_count
            )));
        }
        Ok(use_elems)
    }
}

impl Default for BalancedSubsampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for BalancedSubsampler {
    fn resample(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<ResampleResult> {
        if x.nrows() != y.len() {
            return Err(MinerError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let use_elems = self.rows_per_class(y)?;
        let mut rng = make_rng(self.seed);

        let mut selected: Vec<usize> = Vec::with_capacity(use_elems * 2);
        for (class, mut rows) in class_indices(y) {
            if rows.len() > use_elems {
                rows.shuffle(&mut rng);
            }
            rows.truncate(use_elems);
            tracing::debug!(class, kept = rows.len(), "Subsampled class");
            selected.extend(rows);
        }

        Ok(take_rows(x, y, &selected))
    }
}

/// Draws a plain random fraction of rows, ignoring class balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomSubsampler {
    fraction: f64,
    seed: Option<u64>,
}

impl RandomSubsampler {
    /// Create a subsampler keeping `fraction` of all rows
    pub fn new(fraction: f64) -> Self {
        Self { fraction, seed: None }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Sampler for RandomSubsampler {
    fn resample(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<ResampleResult> {
        validate_fraction(self.fraction)?;
        let n = x.nrows();
        if n == 0 {
            return Err(MinerError::ValidationError("cannot subsample an empty dataset".to_string()));
        }
        let keep = ((n as f64 * self.fraction) as usize).clamp(1, n);

        let mut rng = make_rng(self.seed);
        let mut rows = rand::seq::index::sample(&mut rng, n, keep).into_vec();
        rows.sort_unstable();

        Ok(take_rows(x, y, &rows))
    }
}
