use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::config::{EnsembleConfig, EnsembleWeights};
use crate::data_handling::{ClassSet, Label};
use crate::error::{ClassifierError, Result};
use crate::models::boosting::GradientBoostedClassifier;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::DecisionTreeClassifier;
use crate::models::distribution::ClassProbabilityDistribution;

/// Weighted arithmetic mean of two distributions over the same classes.
///
/// `P(c) = (w_tree * P_tree(c) + w_boost * P_boost(c)) / (w_tree + w_boost)`
pub fn soft_vote(tree: &[f64], boosting: &[f64], weights: &EnsembleWeights) -> Vec<f64> {
    assert_eq!(tree.len(), boosting.len(), "distributions must cover the same classes");
    let total = weights.total();
    tree.iter()
        .zip(boosting.iter())
        .map(|(a, b)| (weights.decision_tree * a + weights.boosting * b) / total)
        .collect()
}

/// Fixed two-model soft vote of a decision tree and a boosted ensemble.
///
/// Both members are fit independently on the same scaled training split;
/// there is no stacking or learned meta-model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingEnsemble {
    classes: ClassSet,
    decision_tree: DecisionTreeClassifier,
    boosting: GradientBoostedClassifier,
    weights: EnsembleWeights,
}

impl VotingEnsemble {
    pub fn new(config: &EnsembleConfig) -> Self {
        VotingEnsemble {
            classes: ClassSet::default(),
            decision_tree: DecisionTreeClassifier::new(config.decision_tree.clone()),
            boosting: GradientBoostedClassifier::new(config.boosting.clone()),
            weights: config.weights,
        }
    }

    /// Fit both members on scaled features and string labels.
    ///
    /// The class set becomes the sorted set of labels seen here.
    pub fn fit_labels(&mut self, x: &Array2<f64>, labels: &[Label]) -> Result<()> {
        self.weights.validate()?;
        let classes = ClassSet::from_labels(labels.iter());
        if classes.is_empty() {
            return Err(ClassifierError::InsufficientData(
                "no labels to train the ensemble on".to_string(),
            ));
        }
        let y = classes.encode(labels)?;
        let n_classes = classes.len();

        log::info!(
            "Fitting {} on {} samples ({} classes)",
            self.decision_tree.name(),
            x.nrows(),
            n_classes
        );
        self.decision_tree.fit(x, &y, n_classes)?;

        log::info!(
            "Fitting {} with {} rounds",
            self.boosting.name(),
            self.boosting.params().num_boost_round
        );
        self.boosting.fit(x, &y, n_classes)?;

        self.classes = classes;
        Ok(())
    }

    pub fn classes(&self) -> &ClassSet {
        &self.classes
    }

    pub fn weights(&self) -> &EnsembleWeights {
        &self.weights
    }

    pub fn decision_tree(&self) -> &DecisionTreeClassifier {
        &self.decision_tree
    }

    pub fn boosting(&self) -> &GradientBoostedClassifier {
        &self.boosting
    }

    /// Combined class probabilities for one scaled sample, in class-set order.
    pub fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        let tree = self.decision_tree.predict_proba_row(row);
        let boosting = self.boosting.predict_proba_row(row);
        soft_vote(&tree, &boosting, &self.weights)
    }

    /// Combined distribution for one scaled sample.
    pub fn predict_distribution(&self, row: ArrayView1<'_, f64>) -> Result<ClassProbabilityDistribution> {
        ClassProbabilityDistribution::new(self.classes.clone(), self.predict_proba_row(row))
    }

    /// Structural checks for a deserialized ensemble.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        self.weights.validate().map_err(|e| e.to_string())?;
        if self.classes.is_empty() {
            return Err("ensemble has an empty class set".to_string());
        }
        let n = self.classes.len();
        if self.decision_tree.n_classes() != n || self.boosting.n_classes() != n {
            return Err(format!(
                "class count mismatch: ensemble {}, decision tree {}, boosting {}",
                n,
                self.decision_tree.n_classes(),
                self.boosting.n_classes()
            ));
        }
        self.decision_tree.validate()?;
        self.boosting.validate()
    }
}
