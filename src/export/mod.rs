//! Model persistence
//!
//! Each builder run writes one pretty-printed JSON artifact named after the
//! algorithm and its best cross-validation score.

mod artifact;

pub use artifact::ModelArtifact;
