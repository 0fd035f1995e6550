//! Relevance vector classifier
//!
//! Sparse Bayesian logistic model over a kernel basis plus a bias column. Each
//! basis function has its own prior precision α. The weight posterior is
//! approximated around its mode (Laplace, found by IRLS) and the precisions are
//! re-estimated by type-II maximum likelihood. Basis functions whose precision
//! diverges are pruned; the survivors are the relevance vectors.

use super::kernels::KernelType;
use super::linalg::{cholesky_solve, log_one_plus_exp_neg, sigmoid, spd_inverse};
use super::models::{check_n_features, check_training_data, Classifier};
use crate::error::{MinerError, Result};
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Largest training set for which the full kernel basis is built
const MAX_BASIS_SAMPLES: usize = 5_000;

/// RVC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RVCConfig {
    /// Kernel function
    pub kernel: KernelType,
    /// Maximum evidence-maximisation iterations
    pub n_iter: usize,
    /// Convergence tolerance on the change of log precisions
    pub tol: f64,
    /// Precision above which a basis function is pruned
    pub alpha_threshold: f64,
    /// Maximum Newton steps for each Laplace approximation
    pub n_iter_solver: usize,
    /// Include a bias basis function
    pub fit_intercept: bool,
}

impl Default for RVCConfig {
    fn default() -> Self {
        Self {
            kernel: KernelType::RBF { gamma: 1.0 },
            n_iter: 100,
            tol: 1e-3,
            alpha_threshold: 1e9,
            n_iter_solver: 25,
            fit_intercept: true,
        }
    }
}

/// Relevance Vector Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceVectorClassifier {
    config: RVCConfig,
    /// Training rows kept as basis centres
    relevance_vectors: Option<Array2<f64>>,
    /// Posterior mean of the active weights (bias last when present)
    weights: Option<Array1<f64>>,
    /// Posterior covariance of the active weights
    covariance: Option<Array2<f64>>,
    /// Whether the bias survived pruning
    has_bias: bool,
    n_features: usize,
}

impl Default for RelevanceVectorClassifier {
    fn default() -> Self {
        Self::new(RVCConfig::default())
    }
}

/// Laplace approximation of the weight posterior
struct Posterior {
    mean: Array1<f64>,
    covariance: Array2<f64>,
}

fn log_posterior(phi: &Array2<f64>, t: &Array1<f64>, alpha: &Array1<f64>, w: &Array1<f64>) -> f64 {
    let margins = phi.dot(w);
    let likelihood: f64 = margins
        .iter()
        .zip(t.iter())
        .map(|(&m, &ti)| {
            let s = if ti > 0.5 { 1.0 } else { -1.0 };
            -log_one_plus_exp_neg(s * m)
        })
        .sum();
    let prior: f64 = alpha.iter().zip(w.iter()).map(|(a, wi)| a * wi * wi).sum();
    likelihood - 0.5 * prior
}

impl RelevanceVectorClassifier {
    /// Create a new RVC
    pub fn new(config: RVCConfig) -> Self {
        Self {
            config,
            relevance_vectors: None,
            weights: None,
            covariance: None,
            has_bias: false,
            n_features: 0,
        }
    }

    /// Access the configuration
    pub fn config(&self) -> &RVCConfig {
        &self.config
    }

    /// Number of retained relevance vectors
    pub fn n_relevance_vectors(&self) -> usize {
        self.relevance_vectors.as_ref().map_or(0, |rv| rv.nrows())
    }

    /// Mode and covariance of `p(w | t, α)` by iteratively reweighted least squares
    fn laplace(
        &self,
        phi: &Array2<f64>,
        t: &Array1<f64>,
        alpha: &Array1<f64>,
        w_init: &Array1<f64>,
    ) -> Result<Posterior> {
        let mut w = w_init.clone();
        let mut objective = log_posterior(phi, t, alpha, &w);

        for _ in 0..self.config.n_iter_solver {
            let y = phi.dot(&w).mapv(sigmoid);
            let grad = phi.t().dot(&(t - &y)) - alpha * &w;
            if grad.iter().fold(0.0f64, |m, g| m.max(g.abs())) < 1e-6 {
                break;
            }

            let hessian = Self::hessian(phi, &y, alpha);
            let step = cholesky_solve(&hessian, &grad).ok_or_else(|| {
                MinerError::ComputationError("RVC Hessian is not positive definite".to_string())
            })?;

            let mut scale = 1.0;
            let mut improved = false;
            while scale > 1e-8 {
                let candidate = &w + &(&step * scale);
                let value = log_posterior(phi, t, alpha, &candidate);
                if value >= objective {
                    w = candidate;
                    objective = value;
                    improved = true;
                    break;
                }
                scale *= 0.5;
            }
            if !improved {
                break;
            }
        }

        let y = phi.dot(&w).mapv(sigmoid);
        let hessian = Self::hessian(phi, &y, alpha);
        let covariance = spd_inverse(&hessian).ok_or_else(|| {
            MinerError::ComputationError("Cannot invert RVC Hessian".to_string())
        })?;

        Ok(Posterior { mean: w, covariance })
    }

    /// `Φᵀ B Φ + A` with `B = diag(y(1-y))`
    fn hessian(phi: &Array2<f64>, y: &Array1<f64>, alpha: &Array1<f64>) -> Array2<f64> {
        let b = y.mapv(|p| p * (1.0 - p));
        let weighted = phi * &b.insert_axis(Axis(1));
        let mut hessian = phi.t().dot(&weighted);
        for (i, a) in alpha.iter().enumerate() {
            hessian[[i, i]] += a;
        }
        hessian
    }

    fn design_matrix(&self, x: &Array2<f64>, centres: &Array2<f64>, bias: bool) -> Result<Array2<f64>> {
        let k = self.config.kernel.matrix(x, centres);
        if bias {
            let ones = Array2::<f64>::ones((x.nrows(), 1));
            Ok(concatenate(Axis(1), &[k.view(), ones.view()])?)
        } else {
            Ok(k)
        }
    }

    /// Mean and variance of the latent activation
    fn activation(&self, x: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        let (rv, w, sigma) = match (&self.relevance_vectors, &self.weights, &self.covariance) {
            (Some(rv), Some(w), Some(sigma)) => (rv, w, sigma),
            _ => return Err(MinerError::ModelNotFitted),
        };
        check_n_features(self.n_features, x)?;

        let phi = self.design_matrix(x, rv, self.has_bias)?;
        let mean = phi.dot(w);
        let variance = (phi.dot(sigma) * &phi).sum_axis(Axis(1));
        Ok((mean, variance))
    }

    /// Latent decision values `φ(x)·w`
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.activation(x)?.0)
    }
}

impl Classifier for RelevanceVectorClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_data(x, y)?;
        let n = x.nrows();
        if n > MAX_BASIS_SAMPLES {
            return Err(MinerError::ValidationError(format!(
                "Dataset has {} samples, exceeding the maximum {} for the RVC basis",
                n, MAX_BASIS_SAMPLES
            )));
        }
        let n_pos = y.iter().filter(|&&v| v > 0.5).count();
        if n_pos == 0 || n_pos == n {
            return Err(MinerError::TrainingError(
                "RVC needs samples of both classes".to_string(),
            ));
        }

        let full_phi = self.design_matrix(x, x, self.config.fit_intercept)?;
        let n_basis = full_phi.ncols();

        // Indices into the full basis that are still active, kept in ascending order
        let mut active: Vec<usize> = (0..n_basis).collect();
        let mut alpha = Array1::<f64>::ones(n_basis);
        let mut w = Array1::<f64>::zeros(n_basis);

        for iteration in 0..self.config.n_iter {
            let phi = full_phi.select(Axis(1), &active);
            let posterior = self.laplace(&phi, y, &alpha, &w)?;

            // γᵢ = 1 − αᵢΣᵢᵢ measures how well-determined each weight is
            let new_alpha: Array1<f64> = (0..active.len())
                .map(|i| {
                    let gamma = (1.0 - alpha[i] * posterior.covariance[[i, i]]).max(1e-12);
                    let w2 = posterior.mean[i] * posterior.mean[i];
                    if w2 > 0.0 { gamma / w2 } else { f64::INFINITY }
                })
                .collect();

            let keep: Vec<usize> = (0..active.len())
                .filter(|&i| new_alpha[i] < self.config.alpha_threshold)
                .collect();
            if keep.is_empty() {
                tracing::debug!(iteration, "RVC would prune every basis function, stopping");
                break;
            }

            let delta = keep
                .iter()
                .map(|&i| (new_alpha[i].ln() - alpha[i].ln()).abs())
                .fold(0.0f64, f64::max);
            let converged = keep.len() == active.len() && delta < self.config.tol;

            active = keep.iter().map(|&i| active[i]).collect();
            alpha = new_alpha.select(Axis(0), &keep);
            w = posterior.mean.select(Axis(0), &keep);

            if converged {
                tracing::debug!(iteration, n_active = active.len(), "RVC converged");
                break;
            }
        }

        let phi = full_phi.select(Axis(1), &active);
        let fitted = self.laplace(&phi, y, &alpha, &w)?;

        let bias_index = if self.config.fit_intercept { Some(n) } else { None };
        let has_bias = bias_index.map_or(false, |b| active.contains(&b));
        let vector_rows: Vec<usize> = active.iter().copied().filter(|&i| i < n).collect();

        // Bias column sits last in both the basis and the active list
        self.relevance_vectors = Some(x.select(Axis(0), &vector_rows));
        self.weights = Some(fitted.mean);
        self.covariance = Some(fitted.covariance);
        self.has_bias = has_bias;
        self.n_features = x.ncols();

        tracing::debug!(
            n_relevance = vector_rows.len(),
            has_bias,
            kernel = self.config.kernel.name(),
            "RVC fitted"
        );

        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (mean, variance) = self.activation(x)?;
        // MacKay's probit approximation to the predictive integral
        Ok(mean
            .iter()
            .zip(variance.iter())
            .map(|(&m, &v)| sigmoid(m / (1.0 + std::f64::consts::PI * v.max(0.0) / 8.0).sqrt()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn clusters() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.3],
            [0.3, 0.2],
            [2.0, 2.1],
            [2.2, 1.9],
            [1.9, 2.3],
            [2.1, 2.0],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_rvc_rbf_separates_clusters() {
        let (x, y) = clusters();
        let mut rvc = RelevanceVectorClassifier::new(RVCConfig {
            kernel: KernelType::RBF { gamma: 0.5 },
            ..Default::default()
        });
        rvc.fit(&x, &y).unwrap();

        assert_eq!(rvc.predict(&x).unwrap(), y);
        assert!(rvc.n_relevance_vectors() <= x.nrows());
    }

    #[test]
    fn test_rvc_linear_kernel() {
        let (x, y) = clusters();
        let mut rvc = RelevanceVectorClassifier::new(RVCConfig {
            kernel: KernelType::Linear,
            ..Default::default()
        });
        rvc.fit(&x, &y).unwrap();

        let proba = rvc.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!(proba[0] < 0.5);
        assert!(proba[7] > 0.5);
    }

    #[test]
    fn test_rvc_prunes_basis() {
        let (x, y) = clusters();
        let mut rvc = RelevanceVectorClassifier::new(RVCConfig {
            kernel: KernelType::RBF { gamma: 0.5 },
            ..Default::default()
        });
        rvc.fit(&x, &y).unwrap();

        assert!(rvc.n_relevance_vectors() < x.nrows());
    }

    #[test]
    fn test_single_class_is_rejected() {
        let (x, _) = clusters();
        let mut rvc = RelevanceVectorClassifier::default();
        assert!(matches!(
            rvc.fit(&x, &Array1::zeros(8)),
            Err(MinerError::TrainingError(_))
        ));
    }

    #[test]
    fn test_not_fitted() {
        let rvc = RelevanceVectorClassifier::default();
        assert!(matches!(
            rvc.predict_proba(&array![[1.0, 1.0]]),
            Err(MinerError::ModelNotFitted)
        ));
    }
}
