use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::BoostingParams;
use crate::data_handling::N_FEATURES;
use crate::error::{ClassifierError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::distribution::softmax;

/// Lower bound on per-sample hessians so leaf weights stay finite.
const MIN_HESSIAN: f64 = 1e-16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum RegressionNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Second-order regression tree fit to one class's gradients.
///
/// Leaf values already include the learning rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<RegressionNode>,
}

struct TreeGrower<'a> {
    x: &'a Array2<f64>,
    grad: ArrayView1<'a, f64>,
    hess: ArrayView1<'a, f64>,
    columns: &'a [usize],
    params: &'a BoostingParams,
    nodes: Vec<RegressionNode>,
}

impl<'a> TreeGrower<'a> {
    fn leaf_value(&self, g: f64, h: f64) -> f64 {
        -g / (h + self.params.lambda) * self.params.learning_rate
    }

    fn build(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let g: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| self.hess[i]).sum();

        let split = if depth >= self.params.max_depth || indices.len() < 2 {
            None
        } else {
            self.best_split(&indices, g, h)
        };

        let Some((feature, threshold)) = split else {
            let value = self.leaf_value(g, h);
            self.nodes.push(RegressionNode::Leaf { value });
            return self.nodes.len() - 1;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[(i, feature)] <= threshold);

        let node_id = self.nodes.len();
        self.nodes.push(RegressionNode::Leaf { value: 0.0 });
        let left = self.build(left_idx, depth + 1);
        let right = self.build(right_idx, depth + 1);
        self.nodes[node_id] = RegressionNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split(&self, indices: &[usize], g: f64, h: f64) -> Option<(usize, f64)> {
        let lambda = self.params.lambda;
        let min_child = self.params.min_child_weight;
        if h < 2.0 * min_child {
            return None;
        }
        let parent_score = g * g / (h + lambda);

        let mut best_gain = 0.0;
        let mut best = None;
        let mut sorted = indices.to_vec();

        for &feature in self.columns {
            sorted.sort_by(|&a, &b| self.x[(a, feature)].total_cmp(&self.x[(b, feature)]));

            let (mut gl, mut hl) = (0.0, 0.0);
            for pos in 1..sorted.len() {
                let moved = sorted[pos - 1];
                gl += self.grad[moved];
                hl += self.hess[moved];

                let lo = self.x[(moved, feature)];
                let hi = self.x[(sorted[pos], feature)];
                if lo == hi {
                    continue;
                }
                let (gr, hr) = (g - gl, h - hl);
                if hl < min_child || hr < min_child {
                    continue;
                }

                let gain = gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent_score;
                if gain > best_gain {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best_gain = gain;
                    best = Some((feature, threshold));
                }
            }
        }
        best
    }
}

impl RegressionTree {
    fn fit<'a>(
        x: &'a Array2<f64>,
        grad: ArrayView1<'a, f64>,
        hess: ArrayView1<'a, f64>,
        rows: &[usize],
        columns: &'a [usize],
        params: &'a BoostingParams,
    ) -> RegressionTree {
        let mut grower = TreeGrower {
            x,
            grad,
            hess,
            columns,
            params,
            nodes: Vec::new(),
        };
        grower.build(rows.to_vec(), 0);
        RegressionTree {
            nodes: grower.nodes,
        }
    }

    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                RegressionNode::Leaf { value } => return *value,
                RegressionNode::Split {
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

    /// Same preorder invariant as the decision tree: children follow their parent.
    fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("regression tree has no nodes".to_string());
        }
        let n_nodes = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                RegressionNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("regression tree leaf {} is not finite", idx));
                    }
                }
                RegressionNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= N_FEATURES || !threshold.is_finite() {
                        return Err(format!(
                            "regression tree node {} has an invalid split (feature {}, threshold {})",
                            idx, feature, threshold
                        ));
                    }
                    if *left <= idx || *right <= idx || *left >= n_nodes || *right >= n_nodes {
                        return Err(format!(
                            "regression tree node {} has invalid children ({}, {})",
                            idx, left, right
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Stochastic gradient boosted trees with a softmax multi-class objective.
///
/// Each round fits one `RegressionTree` per class on the gradient and
/// hessian of the multi-class log-loss at the current scores. Rows are
/// subsampled once per round and columns once per tree, both drawn from a
/// `StdRng` seeded from `BoostingParams::seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    params: BoostingParams,
    n_classes: usize,
    /// `rounds[r][k]` is the tree for class `k` in round `r`.
    rounds: Vec<Vec<RegressionTree>>,
}

impl GradientBoostedClassifier {
    pub fn new(params: BoostingParams) -> Self {
        GradientBoostedClassifier {
            params,
            n_classes: 0,
            rounds: Vec::new(),
        }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Raw additive scores per class before softmax.
    pub fn decision_function(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        let mut scores = vec![0.0; self.n_classes];
        for round in &self.rounds {
            for (score, tree) in scores.iter_mut().zip(round.iter()) {
                *score += tree.predict(row);
            }
        }
        scores
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.rounds.is_empty() {
            return Err("boosted ensemble has no trees".to_string());
        }
        for (r, round) in self.rounds.iter().enumerate() {
            if round.len() != self.n_classes {
                return Err(format!(
                    "boosting round {} has {} trees, expected {}",
                    r,
                    round.len(),
                    self.n_classes
                ));
            }
            for tree in round {
                tree.validate()?;
            }
        }
        Ok(())
    }

    fn sample_count(fraction: f64, total: usize) -> usize {
        ((fraction * total as f64).round() as usize).clamp(1, total)
    }

    fn draw(rng: &mut StdRng, fraction: f64, total: usize) -> Vec<usize> {
        if fraction >= 1.0 {
            return (0..total).collect();
        }
        let mut picked = index::sample(rng, total, Self::sample_count(fraction, total)).into_vec();
        picked.sort_unstable();
        picked
    }
}

fn log_loss(scores: &Array2<f64>, y: &[usize]) -> f64 {
    let total: f64 = scores
        .axis_iter(Axis(0))
        .zip(y.iter())
        .map(|(row, &label)| {
            let p = softmax(&row.to_vec());
            -(p[label].max(1e-15)).ln()
        })
        .sum();
    total / y.len() as f64
}

impl ClassifierModel for GradientBoostedClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 || n_classes == 0 {
            return Err(ClassifierError::InsufficientData(
                "boosted ensemble needs at least one sample, feature and class".to_string(),
            ));
        }
        if n_samples != y.len() {
            return Err(ClassifierError::InsufficientData(format!(
                "{} rows but {} labels",
                n_samples,
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(ClassifierError::UnknownClass(format!("class index {}", bad)));
        }

        self.n_classes = n_classes;
        self.rounds.clear();

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut scores = Array2::<f64>::zeros((n_samples, n_classes));
        let mut grad = Array2::<f64>::zeros((n_samples, n_classes));
        let mut hess = Array2::<f64>::zeros((n_samples, n_classes));

        for round in 0..self.params.num_boost_round {
            for (i, row) in scores.axis_iter(Axis(0)).enumerate() {
                let p = softmax(&row.to_vec());
                for k in 0..n_classes {
                    let target = if y[i] == k { 1.0 } else { 0.0 };
                    grad[(i, k)] = p[k] - target;
                    hess[(i, k)] = (2.0 * p[k] * (1.0 - p[k])).max(MIN_HESSIAN);
                }
            }

            let rows = Self::draw(&mut rng, self.params.subsample, n_samples);
            let mut trees = Vec::with_capacity(n_classes);
            for k in 0..n_classes {
                let columns = Self::draw(&mut rng, self.params.colsample_bytree, n_features);
                let tree = RegressionTree::fit(
                    x,
                    grad.column(k),
                    hess.column(k),
                    &rows,
                    &columns,
                    &self.params,
                );
                for (i, row) in x.axis_iter(Axis(0)).enumerate() {
                    scores[(i, k)] += tree.predict(row);
                }
                trees.push(tree);
            }
            self.rounds.push(trees);

            if log::log_enabled!(log::Level::Debug) && (round + 1) % 10 == 0 {
                log::debug!(
                    "Boosting round {}/{}: train mlogloss {:.5}",
                    round + 1,
                    self.params.num_boost_round,
                    log_loss(&scores, y)
                );
            }
        }

        log::debug!(
            "Fitted boosted ensemble: {} rounds x {} classes",
            self.rounds.len(),
            n_classes
        );
        Ok(())
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        softmax(&self.decision_function(row))
    }

    fn name(&self) -> &str {
        "gradient_boosting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_params() -> BoostingParams {
        BoostingParams {
            num_boost_round: 20,
            max_depth: 3,
            learning_rate: 0.3,
            min_child_weight: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            lambda: 1.0,
            seed: 7,
        }
    }

    #[test]
    fn learns_three_separated_groups() {
        let x = array![
            [0.0, 0.1],
            [0.1, 0.0],
            [0.5, 0.5],
            [0.6, 0.4],
            [1.0, 0.9],
            [0.9, 1.0],
        ];
        let y = vec![0, 0, 1, 1, 2, 2];
        let mut model = GradientBoostedClassifier::new(small_params());
        model.fit(&x, &y, 3).unwrap();

        assert_eq!(model.n_rounds(), 20);
        for (i, row) in x.rows().into_iter().enumerate() {
            let p = model.predict_proba_row(row);
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert_eq!(model.predict_row(row), y[i], "row {} probs {:?}", i, p);
        }
    }

    #[test]
    fn no_rounds_gives_uniform_distribution() {
        let x = array![[0.0], [1.0]];
        let mut params = small_params();
        params.num_boost_round = 0;
        let mut model = GradientBoostedClassifier::new(params);
        model.fit(&x, &[0, 1], 2).unwrap();
        let p = model.predict_proba_row(array![0.3].view());
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!(model.validate().is_err());
    }

    #[test]
    fn malformed_regression_tree_fails_validation() {
        let split = |feature, threshold, left, right| RegressionNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        let tree = |root| RegressionTree {
            nodes: vec![
                root,
                RegressionNode::Leaf { value: -0.2 },
                RegressionNode::Leaf { value: 0.4 },
            ],
        };
        assert!(tree(split(3, 0.5, 1, 2)).validate().is_ok());
        assert!(tree(split(N_FEATURES, 0.5, 1, 2)).validate().is_err());
        assert!(tree(split(3, f64::INFINITY, 1, 2)).validate().is_err());
        assert!(tree(split(3, 0.5, 0, 0)).validate().is_err());
        assert!(tree(RegressionNode::Leaf { value: f64::NAN }).validate().is_err());
    }

    #[test]
    fn subsampling_is_seeded() {
        let x = Array2::from_shape_fn((40, 3), |(r, c)| ((r * 7 + c * 3) % 11) as f64 / 10.0);
        let y: Vec<usize> = (0..40).map(|r| r % 2).collect();
        let mut params = small_params();
        params.subsample = 0.6;
        params.colsample_bytree = 0.5;

        let mut a = GradientBoostedClassifier::new(params.clone());
        let mut b = GradientBoostedClassifier::new(params);
        a.fit(&x, &y, 2).unwrap();
        b.fit(&x, &y, 2).unwrap();
        assert_eq!(a, b);
    }
}
