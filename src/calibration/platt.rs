//! Platt scaling (sigmoid calibration)

use crate::error::{MinerError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Platt scaling calibrator
///
/// Fits `P(y=1|f) = 1 / (1 + exp(A*f + B))` where `f` is a raw decision value.
/// The fit is Newton's method with backtracking on the regularised targets
/// proposed by Platt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlattScaling {
    /// Slope parameter A
    a: Option<f64>,
    /// Intercept parameter B
    b: Option<f64>,
    /// Maximum Newton iterations
    max_iter: usize,
    /// Smallest step accepted by the line search
    min_step: f64,
}

impl PlattScaling {
    /// Create new Platt scaling calibrator
    pub fn new() -> Self {
        Self {
            a: None,
            b: None,
            max_iter: 100,
            min_step: 1e-10,
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Get fitted parameters
    pub fn parameters(&self) -> Option<(f64, f64)> {
        match (self.a, self.b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    fn objective(decision: &Array1<f64>, targets: &[f64], a: f64, b: f64) -> f64 {
        decision
            .iter()
            .zip(targets.iter())
            .map(|(&f, &t)| {
                let z = f * a + b;
                if z >= 0.0 {
                    t * z + (-z).exp().ln_1p()
                } else {
                    (t - 1.0) * z + z.exp().ln_1p()
                }
            })
            .sum()
    }

    fn probability(z: f64) -> f64 {
        if z >= 0.0 {
            let e = (-z).exp();
            e / (1.0 + e)
        } else {
            1.0 / (1.0 + z.exp())
        }
    }

    /// Fit on decision values and binary labels
    pub fn fit(&mut self, decision: &Array1<f64>, labels: &Array1<f64>) -> Result<()> {
        let n = decision.len();
        if n != labels.len() {
            return Err(MinerError::ValidationError(
                "Decision values and labels must have same length".to_string(),
            ));
        }
        if n == 0 {
            return Err(MinerError::ValidationError("Empty input".to_string()));
        }

        let n_pos = labels.iter().filter(|&&y| y > 0.5).count() as f64;
        let n_neg = n as f64 - n_pos;

        // Platt's adjustment keeps the targets away from 0 and 1
        let target_pos = (n_pos + 1.0) / (n_pos + 2.0);
        let target_neg = 1.0 / (n_neg + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&y| if y > 0.5 { target_pos } else { target_neg })
            .collect();

        let mut a = 0.0;
        let mut b = ((n_neg + 1.0) / (n_pos + 1.0)).ln();
        let mut fval = Self::objective(decision, &targets, a, b);

        for _ in 0..self.max_iter {
            let mut h11 = 1e-12;
            let mut h22 = 1e-12;
            let mut h21 = 0.0;
            let mut g1 = 0.0;
            let mut g2 = 0.0;

            for (&f, &t) in decision.iter().zip(targets.iter()) {
                let p = Self::probability(f * a + b);
                let d2 = p * (1.0 - p);
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < 1e-5 && g2.abs() < 1e-5 {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let delta_a = -(h22 * g1 - h21 * g2) / det;
            let delta_b = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * delta_a + g2 * delta_b;

            let mut step = 1.0;
            let mut accepted = false;
            while step >= self.min_step {
                let new_a = a + step * delta_a;
                let new_b = b + step * delta_b;
                let new_f = Self::objective(decision, &targets, new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    accepted = true;
                    break;
                }
                step /= 2.0;
            }

            if !accepted {
                tracing::debug!("Platt scaling line search failed");
                break;
            }
        }

        self.a = Some(a);
        self.b = Some(b);

        Ok(())
    }

    /// Map decision values to positive-class probabilities
    pub fn transform(&self, decision: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b) = self.parameters().ok_or(MinerError::ModelNotFitted)?;
        Ok(decision.mapv(|f| Self::probability(f * a + b)))
    }
}

impl Default for PlattScaling {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_platt_scaling_is_monotone() {
        let decision = array![-2.0, -1.5, -0.3, 0.4, 1.2, 2.5, -0.8, 0.9];
        let labels = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0];

        let mut calibrator = PlattScaling::new();
        calibrator.fit(&decision, &labels).unwrap();

        let proba = calibrator.transform(&array![-3.0, 0.0, 3.0]).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!(proba[0] < proba[1] && proba[1] < proba[2]);

        let (a, _) = calibrator.parameters().unwrap();
        assert!(a < 0.0);
    }

    #[test]
    fn test_balanced_uninformative_scores() {
        let decision = array![0.0, 0.0, 0.0, 0.0];
        let labels = array![0.0, 1.0, 0.0, 1.0];

        let mut calibrator = PlattScaling::new();
        calibrator.fit(&decision, &labels).unwrap();

        let proba = calibrator.transform(&array![0.0]).unwrap();
        assert!((proba[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_not_fitted() {
        let calibrator = PlattScaling::new();
        assert!(calibrator.transform(&array![1.0]).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let mut calibrator = PlattScaling::new();
        assert!(calibrator.fit(&array![1.0, 2.0], &array![1.0]).is_err());
    }
}
