//! CART classification tree

use super::models::{check_n_features, check_training_data};
use crate::error::{MinerError, Result};
use ndarray::{Array1, Array2};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the fraction of positive samples that reached it
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Criterion {
    /// Gini impurity
    Gini,
    /// Shannon entropy
    Entropy,
}

impl Criterion {
    /// Parse `gini` / `entropy`
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "gini" => Ok(Criterion::Gini),
            "entropy" => Ok(Criterion::Entropy),
            other => Err(MinerError::ConfigError(format!("Unknown criterion '{}'", other))),
        }
    }

    fn impurity(self, negatives: f64, positives: f64) -> f64 {
        let n = negatives + positives;
        if n <= 0.0 {
            return 0.0;
        }
        let p0 = negatives / n;
        let p1 = positives / n;
        match self {
            Criterion::Gini => 1.0 - p0 * p0 - p1 * p1,
            Criterion::Entropy => {
                let term = |p: f64| if p > 0.0 { -p * p.log2() } else { 0.0 };
                term(p0) + term(p1)
            }
        }
    }
}

/// Candidate split found while scanning one feature
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at random for each split (all when `None`)
    pub max_features: Option<usize>,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for the per-split feature draws
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set the number of features tried per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_training_data(x, y)?;

        self.n_features = x.ncols();
        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut rng));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let positives: f64 = indices.iter().map(|&i| y[i]).sum();
        let negatives = n_samples as f64 - positives;
        let leaf = TreeNode::Leaf {
            value: positives / n_samples.max(1) as f64,
            n_samples,
        };

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || positives == 0.0
            || negatives == 0.0;

        if should_stop {
            return leaf;
        }

        let parent_impurity = self.criterion.impurity(negatives, positives);
        let features = self.draw_features(rng);

        let best = match self.find_best_split(x, y, indices, &features, parent_impurity) {
            Some(best) => best,
            None => return leaf,
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity: parent_impurity,
        }
    }

    fn draw_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let n_features = self.n_features;
        match self.max_features {
            Some(k) if k < n_features => index::sample(rng, n_features, k).into_vec(),
            _ => (0..n_features).collect(),
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len() as f64;
        let total_pos: f64 = indices.iter().map(|&i| y[i]).sum();
        let min_leaf = self.min_samples_leaf;

        // Each feature is scanned independently: sort once, then sweep with running class counts
        features
            .par_iter()
            .filter_map(|&feature_idx| {
                let mut values: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i]))
                    .collect();
                values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut best: Option<SplitCandidate> = None;
                let mut left_pos = 0.0;

                for k in 1..values.len() {
                    left_pos += values[k - 1].1;
                    if values[k].0 <= values[k - 1].0 {
                        continue;
                    }
                    let left_count = k;
                    let right_count = values.len() - k;
                    if left_count < min_leaf || right_count < min_leaf {
                        continue;
                    }

                    let left_impurity = self.criterion.impurity(left_count as f64 - left_pos, left_pos);
                    let right_pos = total_pos - left_pos;
                    let right_impurity = self.criterion.impurity(right_count as f64 - right_pos, right_pos);
                    let weighted = (left_count as f64 * left_impurity + right_count as f64 * right_impurity) / n;
                    let gain = parent_impurity - weighted;

                    if gain > best.map_or(1e-12, |b| b.gain) {
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: (values[k - 1].0 + values[k].0) / 2.0,
                            gain,
                        });
                    }
                }

                best
            })
            .reduce_with(|a, b| {
                if b.gain > a.gain || (b.gain == a.gain && b.feature_idx < a.feature_idx) {
                    b
                } else {
                    a
                }
            })
    }

    /// Probability of the positive class for each row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(MinerError::ModelNotFitted)?;
        check_n_features(self.n_features, x)?;

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value, .. } => return *value,
                        TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                            node = if row[*feature_idx] <= *threshold { left } else { right };
                        }
                    }
                }
            })
            .collect())
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_simple() {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [1.0, 1.0],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&x).unwrap();
        assert_eq!(proba, y);
        assert_eq!(tree.get_depth(), 2);
        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_max_depth(Some(2));
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 3);
    }

    #[test]
    fn test_min_samples_leaf_limits_splits() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 1.0, 1.0, 1.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&x).unwrap();
        assert!((proba[0] - 0.5).abs() < 1e-12);
        assert!((proba[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_criterion() {
        assert!((Criterion::Entropy.impurity(5.0, 5.0) - 1.0).abs() < 1e-12);
        assert!((Criterion::Gini.impurity(5.0, 5.0) - 0.5).abs() < 1e-12);
        assert_eq!(Criterion::from_name("entropy").unwrap(), Criterion::Entropy);
        assert!(Criterion::from_name("mse").is_err());
    }

    #[test]
    fn test_feature_subset_is_reproducible() {
        let x = array![
            [0.0, 5.0, 1.0],
            [0.1, 4.0, 0.0],
            [0.9, 3.0, 1.0],
            [1.0, 2.0, 0.0],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut a = DecisionTree::new().with_max_features(1).with_random_state(3);
        let mut b = DecisionTree::new().with_max_features(1).with_random_state(3);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_not_fitted() {
        let tree = DecisionTree::new();
        assert!(matches!(
            tree.predict_proba(&array![[1.0]]),
            Err(MinerError::ModelNotFitted)
        ));
    }
}
