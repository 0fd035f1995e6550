//! Probability calibration for margin classifiers

mod platt;

pub use platt::PlattScaling;
