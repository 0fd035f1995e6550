//! Receiver operating characteristic curves and area under the curve

use crate::error::{MinerError, Result};
use crate::preprocessing::TrainTestSplit;
use crate::training::{cross_val_score, CVResults, Classifier, CrossValidator};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Points of a ROC curve, ordered by decreasing threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocCurve {
    /// False positive rate at each threshold
    pub fpr: Vec<f64>,
    /// True positive rate at each threshold
    pub tpr: Vec<f64>,
    /// Score threshold; the first entry is `+inf` so the curve starts at (0, 0)
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Trapezoidal area under this curve
    pub fn auc(&self) -> Result<f64> {
        auc(&self.fpr, &self.tpr)
    }

    /// Number of points on the curve
    pub fn len(&self) -> usize {
        self.fpr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fpr.is_empty()
    }
}

/// Compute the ROC curve of a binary problem.
///
/// Scores are ranked in decreasing order and one point is emitted per distinct
/// score. Points that lie on a straight segment between their neighbours are
/// dropped.
pub fn roc_curve(y_true: &Array1<f64>, y_score: &Array1<f64>) -> Result<RocCurve> {
    if y_true.len() != y_score.len() {
        return Err(MinerError::ShapeError {
            expected: format!("{} scores", y_true.len()),
            actual: format!("{} scores", y_score.len()),
        });
    }
    if y_score.iter().any(|s| s.is_nan()) {
        return Err(MinerError::ValidationError("ROC scores contain NaN".to_string()));
    }

    let n_pos = y_true.iter().filter(|&&v| v > 0.5).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(MinerError::ValidationError(
            "ROC curve needs both positive and negative samples".to_string(),
        ));
    }

    // Stable, so equal scores keep input order
    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| y_score[b].total_cmp(&y_score[a]));

    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let mut thresholds = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);
    for (pos, &idx) in order.iter().enumerate() {
        if y_true[idx] > 0.5 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_run = order
            .get(pos + 1)
            .map_or(true, |&next| y_score[next] != y_score[idx]);
        if last_of_run {
            tps.push(tp);
            fps.push(fp);
            thresholds.push(y_score[idx]);
        }
    }

    if tps.len() > 2 {
        let keep: Vec<usize> = (0..tps.len())
            .filter(|&i| {
                i == 0
                    || i + 1 == tps.len()
                    || fps[i + 1] - 2.0 * fps[i] + fps[i - 1] != 0.0
                    || tps[i + 1] - 2.0 * tps[i] + tps[i - 1] != 0.0
            })
            .collect();
        tps = keep.iter().map(|&i| tps[i]).collect();
        fps = keep.iter().map(|&i| fps[i]).collect();
        thresholds = keep.iter().map(|&i| thresholds[i]).collect();
    }

    let fpr = std::iter::once(0.0).chain(fps.iter().map(|f| f / n_neg as f64)).collect();
    let tpr = std::iter::once(0.0).chain(tps.iter().map(|t| t / n_pos as f64)).collect();
    let thresholds = std::iter::once(f64::INFINITY).chain(thresholds).collect();

    Ok(RocCurve { fpr, tpr, thresholds })
}

/// Area under a curve by the trapezoidal rule.
///
/// `x` must be monotonic, either increasing or decreasing.
pub fn auc(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(MinerError::ShapeError {
            expected: format!("{} y values", x.len()),
            actual: format!("{} y values", y.len()),
        });
    }
    if x.len() < 2 {
        return Err(MinerError::ValidationError(format!(
            "At least 2 points are needed to compute area under curve, got {}",
            x.len()
        )));
    }

    let direction = if x.windows(2).all(|w| w[1] >= w[0]) {
        1.0
    } else if x.windows(2).all(|w| w[1] <= w[0]) {
        -1.0
    } else {
        return Err(MinerError::ValidationError(
            "x is neither increasing nor decreasing".to_string(),
        ));
    };

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum();
    Ok(direction * area)
}

/// Area under the ROC curve of the given scores
pub fn roc_auc_score(y_true: &Array1<f64>, y_score: &Array1<f64>) -> Result<f64> {
    roc_curve(y_true, y_score)?.auc()
}

/// ROC AUC of a fitted classifier on labelled data
pub fn roc_auc_scorer<E: Classifier>(estimator: &E, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
    roc_auc_score(y, &estimator.predict_proba(x)?)
}

/// Stratified k-fold cross-validated ROC AUC
pub fn cross_val_roc_auc<E, F>(
    make_estimator: F,
    x: &Array2<f64>,
    y: &Array1<f64>,
    cv_folds: usize,
) -> Result<CVResults>
where
    E: Classifier,
    F: Fn() -> Result<E>,
{
    let splits = CrossValidator::stratified(cv_folds).split(x.nrows(), Some(y))?;
    cross_val_score(make_estimator, x, y, &splits, roc_auc_scorer::<E>)
}

/// ROC evaluation of one model on a train/test split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocEntry {
    /// Legend label
    pub label: String,
    /// Cross-validated AUC on the training split
    pub cv_auc: CVResults,
    /// Curve on the held-out split
    pub curve: RocCurve,
    /// Area under `curve`
    pub auc: f64,
}

/// Cross-validate, refit on the training split, and trace the ROC curve on the test split.
///
/// `estimator` is used as a template and is not modified.
pub fn evaluate_roc<E>(label: &str, estimator: &E, split: &TrainTestSplit, cv_folds: usize) -> Result<RocEntry>
where
    E: Classifier + Clone,
{
    let cv_auc = cross_val_roc_auc(|| Ok(estimator.clone()), &split.x_train, &split.y_train, cv_folds)?;
    tracing::info!(
        model = label,
        "ROC AUC: {:.2} (+/- {:.2})",
        cv_auc.mean_score,
        cv_auc.std_score
    );

    let mut model = estimator.clone();
    model.fit(&split.x_train, &split.y_train)?;
    let y_score = model.predict_proba(&split.x_test)?;
    let curve = roc_curve(&split.y_test, &y_score)?;
    let auc = curve.auc()?;

    Ok(RocEntry {
        label: label.to_string(),
        cv_auc,
        curve,
        auc,
    })
}
