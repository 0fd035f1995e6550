//! Preprocessing: feature matrix construction and train/test partitioning

pub mod matrix;
pub mod split;

pub use matrix::{FeatureMatrixBuilder, LabeledMatrix, SampleClass};
pub use split::{train_test_split, TrainTestSplit};
