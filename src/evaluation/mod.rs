//! Model evaluation
//!
//! ROC curves, trapezoidal AUC and cross-validated ROC AUC.

pub mod roc;

pub use roc::{auc, cross_val_roc_auc, evaluate_roc, roc_auc_score, roc_curve, RocCurve, RocEntry};
