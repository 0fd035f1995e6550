//! Support vector classifier
//!
//! The dual problem is solved with SMO using the maximal-violating-pair working
//! set selection. Probabilities come from Platt scaling fitted on out-of-fold
//! decision values.

use super::cross_validation::{CVStrategy, CrossValidator};
use super::kernels::KernelType;
use super::models::{check_n_features, check_training_data, select_rows, Classifier};
use crate::calibration::PlattScaling;
use crate::error::{MinerError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training will return an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Folds used to collect decision values for Platt scaling
const PLATT_FOLDS: usize = 5;

/// Curvature floor for degenerate pairs
const TAU: f64 = 1e-12;

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Tolerance for the KKT violation stopping criterion
    pub tol: f64,
    /// Maximum number of SMO iterations
    pub max_iter: usize,
    /// Fit a Platt calibrator so `predict_proba` is available
    pub probability: bool,
    /// Random seed for the calibration folds
    pub random_state: Option<u64>,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::default(),
            tol: 1e-3,
            max_iter: 1_000_000,
            probability: true,
            random_state: None,
        }
    }
}

/// Solution of one SMO run
struct DualSolution {
    alphas: Array1<f64>,
    bias: f64,
    iterations: usize,
}

/// Support Vector Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    /// Support vectors
    support_vectors: Option<Array2<f64>>,
    /// `alpha_i * y_i` for each support vector
    dual_coef: Option<Array1<f64>>,
    /// Bias term
    bias: f64,
    /// Sigmoid calibration of the decision values
    calibrator: Option<PlattScaling>,
    n_features: usize,
}

impl Default for SVMClassifier {
    fn default() -> Self {
        Self::new(SVMConfig::default())
    }
}

impl SVMClassifier {
    /// Create a new SVM classifier
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            dual_coef: None,
            bias: 0.0,
            calibrator: None,
            n_features: 0,
        }
    }

    /// Access the configuration
    pub fn config(&self) -> &SVMConfig {
        &self.config
    }

    /// Get number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.as_ref().map_or(0, |sv| sv.nrows())
    }

    fn validate(&self) -> Result<()> {
        if !(self.config.c > 0.0) || !self.config.c.is_finite() {
            return Err(MinerError::ConfigError(format!(
                "C must be positive, got {}",
                self.config.c
            )));
        }
        Ok(())
    }

    /// Solve the dual for labels `y ∈ {-1, +1}`
    fn smo_train(&self, k: &Array2<f64>, y: &Array1<f64>) -> DualSolution {
        let n = y.len();
        let c = self.config.c;
        let mut alphas = Array1::<f64>::zeros(n);
        // Gradient of ½αᵀQα − eᵀα with Q_ij = y_i y_j K_ij
        let mut grad = Array1::<f64>::from_elem(n, -1.0);

        let in_up = |t: usize, a: f64| (y[t] > 0.0 && a < c) || (y[t] < 0.0 && a > 0.0);
        let in_low = |t: usize, a: f64| (y[t] > 0.0 && a > 0.0) || (y[t] < 0.0 && a < c);

        let mut iterations = 0;
        while iterations < self.config.max_iter {
            let mut i = None;
            let mut m = f64::NEG_INFINITY;
            let mut j = None;
            let mut big_m = f64::INFINITY;
            for t in 0..n {
                let v = -y[t] * grad[t];
                if in_up(t, alphas[t]) && v > m {
                    m = v;
                    i = Some(t);
                }
                if in_low(t, alphas[t]) && v < big_m {
                    big_m = v;
                    j = Some(t);
                }
            }

            let (i, j) = match (i, j) {
                (Some(i), Some(j)) if m - big_m >= self.config.tol => (i, j),
                _ => break,
            };
            iterations += 1;

            let old_i = alphas[i];
            let old_j = alphas[j];
            let q_ij = y[i] * y[j] * k[[i, j]];

            if y[i] != y[j] {
                let quad = (k[[i, i]] + k[[j, j]] + 2.0 * q_ij).max(TAU);
                let delta = (-grad[i] - grad[j]) / quad;
                let diff = alphas[i] - alphas[j];
                alphas[i] += delta;
                alphas[j] += delta;
                if diff > 0.0 {
                    if alphas[j] < 0.0 {
                        alphas[j] = 0.0;
                        alphas[i] = diff;
                    }
                } else if alphas[i] < 0.0 {
                    alphas[i] = 0.0;
                    alphas[j] = -diff;
                }
                if diff > 0.0 {
                    if alphas[i] > c {
                        alphas[i] = c;
                        alphas[j] = c - diff;
                    }
                } else if alphas[j] > c {
                    alphas[j] = c;
                    alphas[i] = c + diff;
                }
            } else {
                let quad = (k[[i, i]] + k[[j, j]] - 2.0 * q_ij).max(TAU);
                let delta = (grad[i] - grad[j]) / quad;
                let sum = alphas[i] + alphas[j];
                alphas[i] -= delta;
                alphas[j] += delta;
                if sum > c {
                    if alphas[i] > c {
                        alphas[i] = c;
                        alphas[j] = sum - c;
                    }
                } else if alphas[j] < 0.0 {
                    alphas[j] = 0.0;
                    alphas[i] = sum;
                }
                if sum > c {
                    if alphas[j] > c {
                        alphas[j] = c;
                        alphas[i] = sum - c;
                    }
                } else if alphas[i] < 0.0 {
                    alphas[i] = 0.0;
                    alphas[j] = sum;
                }
            }

            let delta_i = alphas[i] - old_i;
            let delta_j = alphas[j] - old_j;
            for t in 0..n {
                grad[t] += y[t] * (y[i] * k[[i, t]] * delta_i + y[j] * k[[j, t]] * delta_j);
            }
        }

        if iterations >= self.config.max_iter {
            tracing::warn!(iterations, "SMO reached the iteration limit before converging");
        }

        DualSolution {
            bias: -Self::compute_rho(&alphas, &grad, y, c),
            alphas,
            iterations,
        }
    }

    fn compute_rho(alphas: &Array1<f64>, grad: &Array1<f64>, y: &Array1<f64>, c: f64) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut free_sum = 0.0;
        let mut n_free = 0usize;

        for t in 0..alphas.len() {
            let yg = y[t] * grad[t];
            if alphas[t] >= c {
                if y[t] < 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else if alphas[t] <= 0.0 {
                if y[t] > 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else {
                free_sum += yg;
                n_free += 1;
            }
        }

        if n_free > 0 {
            free_sum / n_free as f64
        } else if upper.is_finite() && lower.is_finite() {
            (upper + lower) / 2.0
        } else if upper.is_finite() {
            upper
        } else if lower.is_finite() {
            lower
        } else {
            0.0
        }
    }

    /// Fit only the margin model, without calibration
    fn fit_margin(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(MinerError::ValidationError(format!(
                "Dataset has {} samples, exceeding the maximum {} for SVM kernel matrix",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }
        let n_pos = y.iter().filter(|&&v| v > 0.5).count();
        if n_pos == 0 || n_pos == n {
            return Err(MinerError::TrainingError(
                "SVC needs samples of both classes".to_string(),
            ));
        }

        let y_signed = y.mapv(|v| if v > 0.5 { 1.0 } else { -1.0 });
        let k = self.config.kernel.matrix(x, x);
        let solution = self.smo_train(&k, &y_signed);

        let support: Vec<usize> = (0..n).filter(|&t| solution.alphas[t] > 0.0).collect();
        let dual_coef: Array1<f64> = support
            .iter()
            .map(|&t| solution.alphas[t] * y_signed[t])
            .collect();

        tracing::debug!(
            n_support = support.len(),
            iterations = solution.iterations,
            kernel = self.config.kernel.name(),
            "SMO finished"
        );

        self.support_vectors = Some(x.select(Axis(0), &support));
        self.dual_coef = Some(dual_coef);
        self.bias = solution.bias;
        self.n_features = x.ncols();
        Ok(())
    }

    /// Out-of-fold decision values used to train the calibrator
    fn calibration_scores(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        let mut cv = CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: PLATT_FOLDS.min(x.nrows()),
            shuffle: true,
        });
        if let Some(seed) = self.config.random_state {
            cv = cv.with_random_state(seed);
        }

        let splits = match cv.split(x.nrows(), Some(y)) {
            Ok(splits) => splits,
            // Too few rows for held-out folds
            Err(_) => {
                let mut model = SVMClassifier::new(self.config.clone());
                model.fit_margin(x, y)?;
                return model.decision_function(x);
            }
        };

        let mut scores = Array1::<f64>::zeros(x.nrows());
        for split in &splits {
            let (x_train, y_train) = select_rows(x, y, &split.train_indices);
            let (x_test, _) = select_rows(x, y, &split.test_indices);

            let n_pos = y_train.iter().filter(|&&v| v > 0.5).count();
            let fold_scores = if n_pos == 0 || n_pos == y_train.len() {
                let constant = if n_pos > 0 { 1.0 } else { -1.0 };
                Array1::from_elem(x_test.nrows(), constant)
            } else {
                let mut model = SVMClassifier::new(self.config.clone());
                model.fit_margin(&x_train, &y_train)?;
                model.decision_function(&x_test)?
            };

            for (&idx, &score) in split.test_indices.iter().zip(fold_scores.iter()) {
                scores[idx] = score;
            }
        }

        Ok(scores)
    }

    /// Signed distance to the separating surface
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (sv, coef) = match (&self.support_vectors, &self.dual_coef) {
            (Some(sv), Some(coef)) => (sv, coef),
            _ => return Err(MinerError::ModelNotFitted),
        };
        check_n_features(self.n_features, x)?;

        let k = self.config.kernel.matrix(x, sv);
        Ok(k.dot(coef) + self.bias)
    }
}

impl Classifier for SVMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_data(x, y)?;
        self.validate()?;

        self.calibrator = None;
        if self.config.probability {
            let scores = self.calibration_scores(x, y)?;
            let mut calibrator = PlattScaling::new();
            calibrator.fit(&scores, y)?;
            self.calibrator = Some(calibrator);
        }

        self.fit_margin(x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let decision = self.decision_function(x)?;
        match &self.calibrator {
            Some(calibrator) => calibrator.transform(&decision),
            None => Err(MinerError::ValidationError(
                "predict_proba requires probability=true".to_string(),
            )),
        }
    }

    /// Labels follow the sign of the decision function, not the calibrated probability
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let decision = self.decision_function(x)?;
        Ok(decision.mapv(|d| if d > 0.0 { 1.0 } else { 0.0 }))
    }
}
