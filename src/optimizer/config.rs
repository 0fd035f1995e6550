//! Search configuration

use super::SamplerType;
use serde::{Deserialize, Serialize};

/// Configuration for randomized hyperparameter search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of candidate configurations
    pub n_iter: usize,

    /// Cross-validation folds per candidate
    pub cv_folds: usize,

    /// Candidate sampler
    pub sampler: SamplerType,

    /// Random seed
    pub random_state: Option<u64>,

    /// Number of top candidates logged after the search
    pub report_top: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_iter: 10,
            cv_folds: 3,
            sampler: SamplerType::Random,
            random_state: None,
            report_top: 3,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set number of candidates
    pub fn with_n_iter(mut self, n: usize) -> Self {
        self.n_iter = n;
        self
    }

    /// Builder method to set CV folds
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Builder method to set sampler
    pub fn with_sampler(mut self, sampler: SamplerType) -> Self {
        self.sampler = sampler;
        self
    }

    /// Builder method to set random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }
}
