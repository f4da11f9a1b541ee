use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::config::DecisionTreeParams;
use crate::data_handling::N_FEATURES;
use crate::error::{ClassifierError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::distribution::PROBABILITY_TOLERANCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Greedy CART classifier using Gini impurity.
///
/// Samples with `x[feature] <= threshold` descend left. Features are scanned
/// in column order and thresholds in ascending order; the first split with
/// the highest impurity decrease wins, so training is fully deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    params: DecisionTreeParams,
    n_classes: usize,
    nodes: Vec<TreeNode>,
}

impl DecisionTreeClassifier {
    pub fn new(params: DecisionTreeParams) -> Self {
        DecisionTreeClassifier {
            params,
            n_classes: 0,
            nodes: Vec::new(),
        }
    }

    pub fn params(&self) -> &DecisionTreeParams {
        &self.params
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Deepest root-to-leaf path, counting edges.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Structural checks for a deserialized tree.
    ///
    /// Nodes are stored in preorder, so every child index must be greater
    /// than its parent's; this also rules out cycles.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("decision tree has no nodes".to_string());
        }
        let n_nodes = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { distribution } => {
                    if distribution.len() != self.n_classes {
                        return Err(format!(
                            "decision tree leaf {} has {} classes, expected {}",
                            idx,
                            distribution.len(),
                            self.n_classes
                        ));
                    }
                    if distribution.iter().any(|p| !(p.is_finite() && *p >= 0.0)) {
                        return Err(format!("decision tree leaf {} has invalid probabilities", idx));
                    }
                    let total: f64 = distribution.iter().sum();
                    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
                        return Err(format!(
                            "decision tree leaf {} sums to {}, expected 1",
                            idx, total
                        ));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= N_FEATURES {
                        return Err(format!(
                            "decision tree node {} splits on feature {}, expected < {}",
                            idx, feature, N_FEATURES
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("decision tree node {} has a non-finite threshold", idx));
                    }
                    if *left <= idx || *right <= idx || *left >= n_nodes || *right >= n_nodes {
                        return Err(format!(
                            "decision tree node {} has invalid children ({}, {})",
                            idx, left, right
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn class_counts(&self, y: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    fn build(&mut self, x: &Array2<f64>, y: &[usize], indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(y, &indices);
        let n = indices.len();
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        let stop = depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || is_pure;

        let split = if stop {
            None
        } else {
            self.best_split(x, y, &indices, &counts)
        };

        let Some(split) = split else {
            let distribution = counts.iter().map(|&c| c as f64 / n as f64).collect();
            self.nodes.push(TreeNode::Leaf { distribution });
            return self.nodes.len() - 1;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[(i, split.feature)] <= split.threshold);

        log::trace!(
            "depth {}: split feature {} at {:.4} (gain {:.5}, {} | {})",
            depth,
            split.feature,
            split.threshold,
            split.gain,
            left_idx.len(),
            right_idx.len()
        );

        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            distribution: Vec::new(),
        });
        let left = self.build(x, y, left_idx, depth + 1);
        let right = self.build(x, y, right_idx, depth + 1);
        self.nodes[node_id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        counts: &[usize],
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;
        let parent = gini(counts, n);

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..x.ncols() {
            sorted.sort_by(|&a, &b| x[(a, feature)].total_cmp(&x[(b, feature)]));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = counts.to_vec();

            for pos in 1..n {
                let moved = sorted[pos - 1];
                left_counts[y[moved]] += 1;
                right_counts[y[moved]] -= 1;

                let lo = x[(moved, feature)];
                let hi = x[(sorted[pos], feature)];
                if lo == hi || pos < min_leaf || n - pos < min_leaf {
                    continue;
                }

                let weighted = (pos as f64 * gini(&left_counts, pos)
                    + (n - pos) as f64 * gini(&right_counts, n - pos))
                    / n as f64;
                let gain = parent - weighted;

                if best.map_or(true, |b| gain > b.gain) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

impl ClassifierModel for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        if x.nrows() == 0 || n_classes == 0 {
            return Err(ClassifierError::InsufficientData(
                "decision tree needs at least one sample and one class".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(ClassifierError::InsufficientData(format!(
                "{} rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(ClassifierError::UnknownClass(format!("class index {}", bad)));
        }

        self.n_classes = n_classes;
        self.nodes.clear();
        self.build(x, y, (0..x.nrows()).collect(), 0);

        log::debug!(
            "Fitted decision tree: {} nodes, {} leaves, depth {}",
            self.nodes.len(),
            self.n_leaves(),
            self.depth()
        );
        Ok(())
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        assert!(self.is_fitted(), "decision tree used before fit");
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { distribution } => return distribution.clone(),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn name(&self) -> &str {
        "decision_tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn stump(feature: usize, left: usize, right: usize) -> DecisionTreeClassifier {
        DecisionTreeClassifier {
            params: DecisionTreeParams::default(),
            n_classes: 2,
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold: 0.5,
                    left,
                    right,
                },
                TreeNode::Leaf {
                    distribution: vec![1.0, 0.0],
                },
                TreeNode::Leaf {
                    distribution: vec![0.25, 0.75],
                },
            ],
        }
    }

    #[test]
    fn well_formed_stump_passes_validation() {
        assert!(stump(6, 1, 2).validate().is_ok());
    }

    #[test]
    fn out_of_range_feature_fails_validation() {
        let err = stump(N_FEATURES, 1, 2).validate().unwrap_err();
        assert!(err.contains("feature"), "{}", err);
    }

    #[test]
    fn backward_children_fail_validation() {
        assert!(stump(0, 0, 0).validate().is_err());
        assert!(stump(0, 2, 1).validate().is_ok());
        assert!(stump(0, 1, 3).validate().is_err());
    }

    #[test]
    fn leaf_distribution_must_be_a_probability() {
        let mut tree = stump(0, 1, 2);
        tree.nodes[2] = TreeNode::Leaf {
            distribution: vec![0.5, 0.6],
        };
        assert!(tree.validate().is_err());
        tree.nodes[2] = TreeNode::Leaf {
            distribution: vec![1.5, -0.5],
        };
        assert!(tree.validate().is_err());
        tree.nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: f64::NAN,
            left: 1,
            right: 2,
        };
        tree.nodes[2] = TreeNode::Leaf {
            distribution: vec![0.0, 1.0],
        };
        assert!(tree.validate().is_err());
    }

    #[test]
    fn separable_data_is_fit_exactly() {
        let x = array![
            [0.1, 1.0],
            [0.2, 0.0],
            [0.3, 1.0],
            [0.7, 0.0],
            [0.8, 1.0],
            [0.9, 0.0],
        ];
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut tree = DecisionTreeClassifier::new(DecisionTreeParams {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        });
        tree.fit(&x, &y, 2).unwrap();

        assert_eq!(tree.depth(), 1);
        for (i, row) in x.rows().into_iter().enumerate() {
            assert_eq!(tree.predict_row(row), y[i]);
        }
        // Midpoint between 0.3 and 0.7.
        assert_eq!(tree.predict_row(array![0.49, 0.0].view()), 0);
        assert_eq!(tree.predict_row(array![0.51, 0.0].view()), 1);
    }

    #[test]
    fn min_samples_leaf_keeps_leaves_mixed() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = vec![0, 1, 1, 1];
        let mut tree = DecisionTreeClassifier::new(DecisionTreeParams {
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 2,
        });
        tree.fit(&x, &y, 2).unwrap();

        let p = tree.predict_proba_row(array![0.0].view());
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!((p[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn max_depth_zero_yields_class_prior() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = vec![0, 1, 1];
        let mut tree = DecisionTreeClassifier::new(DecisionTreeParams {
            max_depth: 0,
            ..DecisionTreeParams::default()
        });
        tree.fit(&x, &y, 3).unwrap();
        let p = tree.predict_proba_row(array![5.0].view());
        assert_eq!(p.len(), 3);
        assert!((p[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(p[2], 0.0);
    }
}
