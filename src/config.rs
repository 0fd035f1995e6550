//! Pipeline configuration

use crate::error::{MinerError, Result};
use crate::optimizer::{SamplerType, SearchConfig};
use crate::training::Algorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Summary-statistics CSV
    pub stats_path: PathBuf,

    /// Tab-separated k-mer table
    pub kmer_path: PathBuf,

    /// Directory receiving one artifact per algorithm
    pub output_dir: PathBuf,

    /// Where the ROC plot is written
    pub roc_output: PathBuf,

    /// Test set size, percent of the subset
    pub test_size: f64,

    /// Size of the random subset, percent of all rows
    pub random_size: f64,

    /// Randomized-search iterations per algorithm
    pub n_iter: usize,

    /// Cross-validation folds
    pub cv_folds: usize,

    /// Latin hypercube candidate sampling
    pub lhs: bool,

    /// Compute and plot ROC curves
    pub roc: bool,

    /// Class-balanced subsample; `false` draws a plain random subset
    pub balance: bool,

    /// Sobol-sequence search spaces for SVC and RVC
    pub sobol: bool,

    /// Sobol sequence length
    pub sobol_num: usize,

    /// Also train logistic regression
    pub logistic: bool,

    /// Number of top candidates logged per search
    pub report_top: usize,

    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_path: PathBuf::from("dat/train.features.clear2.csv"),
            kmer_path: PathBuf::from("dat/train.features.kmer"),
            output_dir: PathBuf::from("cv"),
            roc_output: PathBuf::from("roc.svg"),
            test_size: 30.0,
            random_size: 10.0,
            n_iter: 10,
            cv_folds: 3,
            lhs: false,
            roc: false,
            balance: true,
            sobol: false,
            sobol_num: 100,
            logistic: false,
            report_top: 3,
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input files
    pub fn with_inputs(mut self, stats_path: impl Into<PathBuf>, kmer_path: impl Into<PathBuf>) -> Self {
        self.stats_path = stats_path.into();
        self.kmer_path = kmer_path.into();
        self
    }

    /// Set the artifact directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the test set size in percent
    pub fn with_test_size(mut self, percent: f64) -> Self {
        self.test_size = percent;
        self
    }

    /// Set the random subset size in percent
    pub fn with_random_size(mut self, percent: f64) -> Self {
        self.random_size = percent;
        self
    }

    /// Set the number of search iterations
    pub fn with_iterations(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Set the number of CV folds
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Enable or disable balanced subsampling
    pub fn with_balance(mut self, balance: bool) -> Self {
        self.balance = balance;
        self
    }

    /// Use Sobol search spaces of the given length
    pub fn with_sobol(mut self, n: usize) -> Self {
        self.sobol = true;
        self.sobol_num = n;
        self
    }

    /// Enable ROC curves, written to `path`
    pub fn with_roc(mut self, path: impl Into<PathBuf>) -> Self {
        self.roc = true;
        self.roc_output = path.into();
        self
    }

    /// Enable or disable Latin hypercube sampling
    pub fn with_lhs(mut self, lhs: bool) -> Self {
        self.lhs = lhs;
        self
    }

    /// Enable or disable logistic regression
    pub fn with_logistic(mut self, logistic: bool) -> Self {
        self.logistic = logistic;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Test set size as a fraction
    pub fn test_fraction(&self) -> f64 {
        self.test_size / 100.0
    }

    /// Random subset size as a fraction
    pub fn subsample_fraction(&self) -> f64 {
        self.random_size / 100.0
    }

    /// Algorithms to train, in order
    pub fn algorithms(&self) -> Vec<Algorithm> {
        let mut algorithms = vec![Algorithm::RandomForest];
        if self.logistic {
            algorithms.push(Algorithm::LogisticRegression);
        }
        algorithms.extend([Algorithm::Svc, Algorithm::Rvc]);
        algorithms
    }

    /// Search settings shared by every builder
    pub fn search_config(&self) -> SearchConfig {
        let sampler = if self.lhs {
            SamplerType::LatinHypercube
        } else {
            SamplerType::Random
        };
        let mut config = SearchConfig::new()
            .with_n_iter(self.n_iter)
            .with_cv_folds(self.cv_folds)
            .with_sampler(sampler);
        config.report_top = self.report_top;
        if let Some(seed) = self.seed {
            config = config.with_random_state(seed);
        }
        config
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 100.0) {
            return Err(MinerError::ConfigError(format!(
                "test_size must be in (0, 100) percent, got {}",
                self.test_size
            )));
        }
        if !(self.random_size > 0.0 && self.random_size <= 100.0) {
            return Err(MinerError::ConfigError(format!(
                "random_size must be in (0, 100] percent, got {}",
                self.random_size
            )));
        }
        if self.n_iter == 0 {
            return Err(MinerError::ConfigError("iterations must be at least 1".to_string()));
        }
        if self.cv_folds < 2 {
            return Err(MinerError::ConfigError(format!(
                "cv must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.sobol && self.sobol_num == 0 {
            return Err(MinerError::ConfigError("sobol_num must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.test_fraction(), 0.3);
        assert_eq!(config.subsample_fraction(), 0.1);
        assert_eq!(config.n_iter, 10);
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.sobol_num, 100);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.algorithms(),
            vec![Algorithm::RandomForest, Algorithm::Svc, Algorithm::Rvc]
        );
    }

    #[test]
    fn test_logistic_is_opt_in() {
        let config = PipelineConfig::new().with_logistic(true);
        assert_eq!(config.algorithms()[1], Algorithm::LogisticRegression);
        assert_eq!(config.algorithms().len(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PipelineConfig::new().with_test_size(0.0).validate().is_err());
        assert!(PipelineConfig::new().with_test_size(100.0).validate().is_err());
        assert!(PipelineConfig::new().with_random_size(0.0).validate().is_err());
        assert!(PipelineConfig::new().with_random_size(100.0).validate().is_ok());
        assert!(PipelineConfig::new().with_iterations(0).validate().is_err());
        assert!(PipelineConfig::new().with_cv_folds(1).validate().is_err());
        assert!(PipelineConfig::new().with_sobol(0).validate().is_err());
    }

    #[test]
    fn test_search_config() {
        let search = PipelineConfig::new()
            .with_iterations(4)
            .with_cv_folds(5)
            .with_lhs(true)
            .with_seed(9)
            .search_config();
        assert_eq!(search.n_iter, 4);
        assert_eq!(search.cv_folds, 5);
        assert_eq!(search.sampler, SamplerType::LatinHypercube);
        assert_eq!(search.random_state, Some(9));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"n_iter": 25, "balance": false}"#).unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.n_iter, 25);
        assert!(!config.balance);
        assert!(PipelineConfig::default().balance);
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.output_dir, PathBuf::from("cv"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = PipelineConfig::new().with_sobol(16).with_seed(1);
        config.save(&path).unwrap();
        assert_eq!(PipelineConfig::from_json_file(&path).unwrap(), config);
    }
}
