//! Model training module
//!
//! Classifiers used by the pipeline and the builders that tune them:
//! - Random Forest (on top of CART decision trees)
//! - Logistic Regression
//! - Support Vector Classifier with Platt-scaled probabilities
//! - Relevance Vector Classifier
//! - Stratified cross-validation

mod models;
pub mod builders;
pub mod cross_validation;
pub mod decision_tree;
pub mod kernels;
pub mod linalg;
pub mod linear_models;
pub mod random_forest;
pub mod rvc;
pub mod svm;

pub use builders::{Algorithm, BuildOutcome, ModelBuilder};
pub use cross_validation::{cross_val_score, CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use kernels::KernelType;
pub use linear_models::{LogisticRegression, Solver};
pub use models::{accuracy, check_training_data, select_rows, Classifier, Estimator};
pub use random_forest::{MaxFeatures, RandomForest};
pub use rvc::{RVCConfig, RelevanceVectorClassifier};
pub use svm::{SVMClassifier, SVMConfig};
