//! Classifier trait, the serializable estimator wrapper and shared helpers

use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use super::rvc::RelevanceVectorClassifier;
use super::svm::SVMClassifier;
use crate::error::{MinerError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Binary classifier over a dense feature matrix.
///
/// Labels are `0.0` (negative) and `1.0` (positive).
pub trait Classifier: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of the positive class for each row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Predicted class labels
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    /// Mean accuracy on the given data
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(accuracy(y, &predictions))
    }
}

/// Fraction of predictions that match the true labels
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Gather the given rows of `x` and `y`
pub fn select_rows(x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
    (x.select(Axis(0), indices), y.select(Axis(0), indices))
}

/// Validate a training set: matching lengths, at least one row, binary labels
pub fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(MinerError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(MinerError::ValidationError("Cannot fit on an empty dataset".to_string()));
    }
    if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(MinerError::ValidationError(format!(
            "Labels must be 0 or 1, found {}",
            bad
        )));
    }
    Ok(())
}

/// Reject prediction input whose width differs from the training data
pub(crate) fn check_n_features(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(MinerError::ShapeError {
            expected: format!("{} features", expected),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

/// Any of the supported classifiers, in a form that can be persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "model")]
pub enum Estimator {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
    Svc(SVMClassifier),
    Rvc(RelevanceVectorClassifier),
}

impl Estimator {
    fn inner(&self) -> &dyn Classifier {
        match self {
            Estimator::RandomForest(m) => m,
            Estimator::LogisticRegression(m) => m,
            Estimator::Svc(m) => m,
            Estimator::Rvc(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Estimator::RandomForest(m) => m,
            Estimator::LogisticRegression(m) => m,
            Estimator::Svc(m) => m,
            Estimator::Rvc(m) => m,
        }
    }

    /// Short display name of the wrapped model
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::RandomForest(_) => "RandomForestClassifier",
            Estimator::LogisticRegression(_) => "LogisticRegression",
            Estimator::Svc(_) => "SVC",
            Estimator::Rvc(_) => "RVC",
        }
    }
}

impl Classifier for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict_proba(x)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        assert!((accuracy(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_select_rows() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let y = array![0.0, 1.0, 0.0];
        let (xs, ys) = select_rows(&x, &y, &[2, 0]);
        assert_eq!(xs, array![[5.0, 6.0], [1.0, 2.0]]);
        assert_eq!(ys, array![0.0, 0.0]);
    }

    #[test]
    fn test_check_training_data() {
        let x = array![[1.0], [2.0]];
        assert!(check_training_data(&x, &array![0.0, 1.0]).is_ok());
        assert!(matches!(
            check_training_data(&x, &array![0.0]),
            Err(MinerError::ShapeError { .. })
        ));
        assert!(matches!(
            check_training_data(&x, &array![0.0, 2.0]),
            Err(MinerError::ValidationError(_))
        ));
    }

    #[test]
    fn test_estimator_delegates() {
        let x = array![[0.0], [0.1], [0.2], [1.0], [1.1], [1.2]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut estimator = Estimator::LogisticRegression(LogisticRegression::new().with_c(10.0));
        estimator.fit(&x, &y).unwrap();

        assert_eq!(estimator.kind(), "LogisticRegression");
        assert_eq!(estimator.score(&x, &y).unwrap(), 1.0);

        let json = serde_json::to_string(&estimator).unwrap();
        let restored: Estimator = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), estimator.predict(&x).unwrap());
    }
}
