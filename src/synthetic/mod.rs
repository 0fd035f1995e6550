//! Row subsampling
//!
//! - Balanced per-class subsampling
//! - Plain random subsampling

mod balanced;

pub use balanced::{BalancedSubsampler, RandomSubsampler};

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<f64>,
    /// Source row of every output row
    pub indices: Vec<usize>,
}

/// Trait for row samplers
pub trait Sampler: Send + Sync {
    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<ResampleResult>;
}

/// Get class distribution, keyed by rounded label
pub fn class_counts(y: &Array1<f64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label.round() as i64).or_insert(0) += 1;
    }
    counts
}

/// Get row indices for each class in ascending label order
pub fn class_indices(y: &Array1<f64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label.round() as i64).or_insert_with(Vec::new).push(i);
    }
    indices
}
