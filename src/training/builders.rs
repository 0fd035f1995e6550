//! Per-algorithm model builders: search space, randomized search, refit, persist

use super::decision_tree::Criterion;
use super::kernels::KernelType;
use super::linear_models::{LogisticRegression, Solver};
use super::models::Estimator;
use super::random_forest::{MaxFeatures, RandomForest};
use super::rvc::{RVCConfig, RelevanceVectorClassifier};
use super::svm::{SVMClassifier, SVMConfig};
use crate::error::{MinerError, Result};
use crate::export::ModelArtifact;
use crate::optimizer::{
    format_params, logspace, pow2_range, sobol_1d, ParameterValue, RandomizedSearch, SearchConfig,
    SearchResult, SearchSpace, TrialParams,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Scale applied to Sobol points to form the SVC `C` grid
const SOBOL_C_SCALE: f64 = 32768.0;

/// Supported learning algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    RandomForest,
    LogisticRegression,
    Svc,
    Rvc,
}

impl Algorithm {
    /// Artifact file prefix
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::RandomForest => "randomforest",
            Algorithm::LogisticRegression => "logisticregression",
            Algorithm::Svc => "svc",
            Algorithm::Rvc => "rvc",
        }
    }

    /// Display label for logs and plot legends
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::RandomForest => "Random Forest",
            Algorithm::LogisticRegression => "Logistic Regression",
            Algorithm::Svc => "SVC",
            Algorithm::Rvc => "RVC",
        }
    }

    /// Hyperparameter space searched for this algorithm.
    ///
    /// `sobol` replaces the kernel-width grids of SVC and RVC with the first
    /// `n` points of a one-dimensional Sobol sequence.
    pub fn search_space(&self, sobol: Option<usize>) -> Result<SearchSpace> {
        let space = match self {
            Algorithm::RandomForest => SearchSpace::new()
                .choice(
                    "max_depth",
                    vec![
                        ParameterValue::Int(5),
                        ParameterValue::Int(4),
                        ParameterValue::Int(3),
                        ParameterValue::None,
                    ],
                )
                .choice("n_estimators", vec![ParameterValue::Int(500), ParameterValue::Int(2000)])
                .int_uniform("max_features", 1, 50)
                .int_uniform("min_samples_split", 2, 50)
                .int_uniform("min_samples_leaf", 1, 50)
                .choice("bootstrap", vec![true, false])
                .choice("criterion", vec!["gini", "entropy"]),
            Algorithm::LogisticRegression => {
                let grid = logspace(-9.0, 3.0, 13);
                SearchSpace::new()
                    .choice("C", grid.clone())
                    .choice("solver", vec!["newton-cg", "lbfgs", "liblinear", "sag"])
                    .choice("dual", vec![false])
                    .choice("tol", grid)
            }
            Algorithm::Svc => {
                let (c_values, gamma_values) = match sobol {
                    Some(n) => {
                        let points = sobol_points(n)?;
                        (points.iter().map(|p| p * SOBOL_C_SCALE).collect(), points)
                    }
                    None => {
                        let grid = pow2_range(-10.0, 11.0, 0.1);
                        (grid.clone(), grid)
                    }
                };
                SearchSpace::new()
                    .choice("C", c_values)
                    .choice("gamma", gamma_values)
                    .choice("kernel", vec!["linear", "rbf"])
            }
            Algorithm::Rvc => {
                let gamma_values = match sobol {
                    Some(n) => sobol_points(n)?,
                    None => pow2_range(-10.0, 11.0, 0.1),
                };
                SearchSpace::new()
                    .choice("gamma", gamma_values)
                    .choice("kernel", vec!["linear", "rbf"])
            }
        };
        Ok(space)
    }

    /// Build an unfitted estimator from one sampled parameter set
    pub fn estimator_from_params(&self, params: &TrialParams, seed: Option<u64>) -> Result<Estimator> {
        let estimator = match self {
            Algorithm::RandomForest => {
                let mut rf = RandomForest::new(param_usize(params, "n_estimators")?)
                    .with_max_depth(optional_usize(params, "max_depth")?)
                    .with_max_features(MaxFeatures::Fixed(param_usize(params, "max_features")?))
                    .with_min_samples_split(param_usize(params, "min_samples_split")?)
                    .with_min_samples_leaf(param_usize(params, "min_samples_leaf")?)
                    .with_bootstrap(param_bool(params, "bootstrap")?)
                    .with_criterion(Criterion::from_name(param_str(params, "criterion")?)?);
                if let Some(seed) = seed {
                    rf = rf.with_random_state(seed);
                }
                Estimator::RandomForest(rf)
            }
            Algorithm::LogisticRegression => {
                let mut lr = LogisticRegression::new()
                    .with_c(param_f64(params, "C")?)
                    .with_solver(Solver::from_name(param_str(params, "solver")?)?)
                    .with_dual(param_bool(params, "dual")?)
                    .with_tol(param_f64(params, "tol")?);
                if let Some(seed) = seed {
                    lr = lr.with_random_state(seed);
                }
                Estimator::LogisticRegression(lr)
            }
            Algorithm::Svc => {
                let kernel = KernelType::from_name(param_str(params, "kernel")?, param_f64(params, "gamma")?)?;
                Estimator::Svc(SVMClassifier::new(SVMConfig {
                    c: param_f64(params, "C")?,
                    kernel,
                    probability: true,
                    random_state: seed,
                    ..Default::default()
                }))
            }
            Algorithm::Rvc => {
                let kernel = KernelType::from_name(param_str(params, "kernel")?, param_f64(params, "gamma")?)?;
                Estimator::Rvc(RelevanceVectorClassifier::new(RVCConfig {
                    kernel,
                    ..Default::default()
                }))
            }
        };
        Ok(estimator)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "randomforest" | "rf" => Ok(Algorithm::RandomForest),
            "logisticregression" | "lr" => Ok(Algorithm::LogisticRegression),
            "svc" => Ok(Algorithm::Svc),
            "rvc" => Ok(Algorithm::Rvc),
            other => Err(MinerError::ConfigError(format!("Unknown algorithm '{}'", other))),
        }
    }
}

fn sobol_points(n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(MinerError::ConfigError("sobol_num must be at least 1".to_string()));
    }
    Ok(sobol_1d(n))
}

fn param<'a>(params: &'a TrialParams, name: &str) -> Result<&'a ParameterValue> {
    params
        .get(name)
        .ok_or_else(|| MinerError::ConfigError(format!("Missing hyperparameter '{}'", name)))
}

fn type_error(name: &str, expected: &str, value: &ParameterValue) -> MinerError {
    MinerError::ConfigError(format!("Hyperparameter '{}' must be {}, got {}", name, expected, value))
}

fn param_f64(params: &TrialParams, name: &str) -> Result<f64> {
    let value = param(params, name)?;
    value.as_float().ok_or_else(|| type_error(name, "a number", value))
}

fn param_usize(params: &TrialParams, name: &str) -> Result<usize> {
    let value = param(params, name)?;
    match value.as_int() {
        Some(v) if v >= 0 => Ok(v as usize),
        _ => Err(type_error(name, "a non-negative integer", value)),
    }
}

fn optional_usize(params: &TrialParams, name: &str) -> Result<Option<usize>> {
    if param(params, name)?.is_none() {
        Ok(None)
    } else {
        param_usize(params, name).map(Some)
    }
}

fn param_bool(params: &TrialParams, name: &str) -> Result<bool> {
    let value = param(params, name)?;
    value.as_bool().ok_or_else(|| type_error(name, "a boolean", value))
}

fn param_str<'a>(params: &'a TrialParams, name: &str) -> Result<&'a str> {
    let value = param(params, name)?;
    value.as_str().ok_or_else(|| type_error(name, "a string", value))
}

/// What a builder run produced
#[derive(Debug)]
pub struct BuildOutcome {
    pub algorithm: Algorithm,
    /// Best candidate refitted on the full training split
    pub estimator: Estimator,
    pub search: SearchResult,
    /// Where the artifact was written
    pub artifact_path: PathBuf,
}

impl BuildOutcome {
    /// Best mean cross-validation accuracy
    pub fn best_score(&self) -> f64 {
        self.search.best_score()
    }
}

/// Runs the randomized search for one algorithm and persists the winner
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    algorithm: Algorithm,
    search: SearchConfig,
    sobol_num: Option<usize>,
}

impl ModelBuilder {
    /// Create a builder with the default search settings
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            search: SearchConfig::default(),
            sobol_num: None,
        }
    }

    /// Set the search configuration
    pub fn with_search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Use Sobol-sequence grids of length `n` for the kernel parameters
    pub fn with_sobol(mut self, n: usize) -> Self {
        self.sobol_num = Some(n);
        self
    }

    /// The algorithm this builder trains
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Search, refit on all of `x`/`y`, and write `<output_dir>/<algorithm>_<score>.json`
    pub fn build(&self, x: &Array2<f64>, y: &Array1<f64>, output_dir: &Path) -> Result<BuildOutcome> {
        let algorithm = self.algorithm;
        let space = algorithm.search_space(self.sobol_num)?;
        let seed = self.search.random_state;

        tracing::info!(
            algorithm = algorithm.name(),
            n_samples = x.nrows(),
            n_features = x.ncols(),
            n_iter = self.search.n_iter,
            cv = self.search.cv_folds,
            "Searching for best parameters"
        );

        let fitted = RandomizedSearch::new(space, self.search.clone())
            .fit(|params| algorithm.estimator_from_params(params, seed), x, y)?;

        tracing::info!(
            algorithm = algorithm.name(),
            best_score = fitted.results.best_score(),
            params = %format_params(fitted.results.best_params()),
            "Search finished"
        );
        tracing::debug!("\n{}", fitted.results.report(self.search.report_top));

        let artifact = ModelArtifact::new(algorithm.name(), &fitted.results, fitted.best_estimator);
        let artifact_path = artifact.save(output_dir)?;

        Ok(BuildOutcome {
            algorithm,
            estimator: artifact.estimator,
            search: fitted.results,
            artifact_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::sobol_1d;
    use crate::training::Classifier;
    use ndarray::array;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.3],
            [0.3, 0.2],
            [0.2, 0.2],
            [0.1, 0.0],
            [2.0, 2.1],
            [2.2, 1.9],
            [1.9, 2.3],
            [2.1, 2.0],
            [2.3, 2.2],
            [1.8, 2.0],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_grid_sizes() {
        assert_eq!(Algorithm::Svc.search_space(None).unwrap().grid_size(), Some(210 * 210 * 2));
        assert_eq!(Algorithm::Rvc.search_space(None).unwrap().grid_size(), Some(210 * 2));
        assert_eq!(
            Algorithm::LogisticRegression.search_space(None).unwrap().grid_size(),
            Some(13 * 4 * 13)
        );
        assert_eq!(Algorithm::RandomForest.search_space(None).unwrap().grid_size(), None);
    }

    #[test]
    fn test_sobol_space_for_svc() {
        let space = Algorithm::Svc.search_space(Some(4)).unwrap();
        assert_eq!(space.grid_size(), Some(4 * 4 * 2));

        let c_values = match &space.parameters()[0].param_type {
            crate::optimizer::ParameterType::Choice { values } => values.clone(),
            _ => panic!("C should be discrete"),
        };
        let expected: Vec<f64> = sobol_1d(4).iter().map(|p| p * 32768.0).collect();
        let actual: Vec<f64> = c_values.iter().filter_map(|v| v.as_float()).collect();
        assert_eq!(actual, expected);

        assert!(Algorithm::Rvc.search_space(Some(0)).is_err());
    }

    #[test]
    fn test_estimator_from_params() {
        let mut params = TrialParams::new();
        params.insert("max_depth".into(), ParameterValue::None);
        params.insert("n_estimators".into(), ParameterValue::Int(7));
        params.insert("max_features".into(), ParameterValue::Int(3));
        params.insert("min_samples_split".into(), ParameterValue::Int(2));
        params.insert("min_samples_leaf".into(), ParameterValue::Int(1));
        params.insert("bootstrap".into(), ParameterValue::Bool(true));
        params.insert("criterion".into(), "entropy".into());

        match Algorithm::RandomForest.estimator_from_params(&params, Some(1)).unwrap() {
            Estimator::RandomForest(rf) => {
                assert_eq!(rf.n_estimators, 7);
                assert_eq!(rf.max_depth, None);
                assert_eq!(rf.criterion, Criterion::Entropy);
            }
            other => panic!("unexpected estimator {}", other.kind()),
        }

        params.remove("criterion");
        assert!(matches!(
            Algorithm::RandomForest.estimator_from_params(&params, None),
            Err(MinerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in [
            Algorithm::RandomForest,
            Algorithm::LogisticRegression,
            Algorithm::Svc,
            Algorithm::Rvc,
        ] {
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
        }
        assert!("knn".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_build_writes_one_artifact() {
        let (x, y) = data();
        let dir = tempfile::tempdir().unwrap();

        let builder = ModelBuilder::new(Algorithm::Svc)
            .with_search_config(SearchConfig::new().with_n_iter(1).with_cv_folds(3).with_random_state(3));
        let outcome = builder.build(&x, &y, dir.path()).unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert!(outcome.artifact_path.file_name().unwrap().to_string_lossy().starts_with("svc_"));
        assert_eq!(outcome.search.candidates.len(), 1);
        assert!(outcome.estimator.predict(&x).is_ok());
    }
}
