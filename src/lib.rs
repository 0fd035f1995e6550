//! plasmidminer - binary classifiers for genomic samples
//!
//! Builds a feature matrix from a summary-statistics CSV and a k-mer table,
//! draws a class-balanced random subset, splits it into train and
//! test sets, and tunes several classifiers with randomized search and
//! cross-validation. The best model per algorithm is written to disk.
//!
//! # Modules
//!
//! ## Data
//! - [`preprocessing`] - Feature matrix construction and train/test split
//! - [`synthetic`] - Balanced and plain random subsampling
//!
//! ## Models
//! - [`training`] - Random forest, logistic regression, SVC, RVC and their builders
//! - [`optimizer`] - Search spaces, candidate samplers, randomized search, Sobol sequences
//! - [`calibration`] - Platt scaling for SVC probabilities
//!
//! ## Reporting
//! - [`evaluation`] - ROC curves and AUC
//! - [`visualization`] - ROC plot rendering
//! - [`export`] - Model artifacts
//!
//! ## Driver
//! - [`config`] - Pipeline configuration
//! - [`pipeline`] - The training run
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod preprocessing;
pub mod synthetic;
pub mod utils;

// Models
pub mod calibration;
pub mod optimizer;
pub mod training;

// Reporting
pub mod evaluation;
pub mod export;
pub mod visualization;

// Driver
pub mod cli;
pub mod config;
pub mod pipeline;

pub use error::{MinerError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{MinerError, Result};

    // Preprocessing
    pub use crate::preprocessing::{train_test_split, FeatureMatrixBuilder, LabeledMatrix, TrainTestSplit};

    // Subsampling
    pub use crate::synthetic::{BalancedSubsampler, RandomSubsampler, ResampleResult, Sampler};

    // Training
    pub use crate::training::{
        Algorithm, BuildOutcome, Classifier, Estimator, LogisticRegression, ModelBuilder, RandomForest,
        RelevanceVectorClassifier, SVMClassifier,
    };

    // Optimization
    pub use crate::optimizer::{RandomizedSearch, SamplerType, SearchConfig, SearchSpace};

    // Evaluation
    pub use crate::evaluation::{auc, roc_curve, RocCurve, RocEntry};

    // Export
    pub use crate::export::ModelArtifact;

    // Driver
    pub use crate::config::PipelineConfig;
    pub use crate::pipeline::{Pipeline, PipelineReport, Progress};
}
