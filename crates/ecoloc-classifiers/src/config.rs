use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Hyper-parameters for the single CART decision tree.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DecisionTreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

/// Hyper-parameters for the softmax gradient boosted tree ensemble.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BoostingParams {
    pub num_boost_round: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_child_weight: f64,
    /// Fraction of rows drawn for every boosting round.
    pub subsample: f64,
    /// Fraction of columns drawn for every tree.
    pub colsample_bytree: f64,
    /// L2 regularization on leaf weights.
    pub lambda: f64,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            num_boost_round: 100,
            max_depth: 10,
            learning_rate: 0.1,
            min_child_weight: 2.0,
            subsample: 0.8,
            colsample_bytree: 0.8,
            lambda: 1.0,
            seed: 42,
        }
    }
}

/// Soft-vote weights for (decision tree, boosted ensemble).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct EnsembleWeights {
    pub decision_tree: f64,
    pub boosting: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            decision_tree: 1.0,
            boosting: 2.0,
        }
    }
}

impl EnsembleWeights {
    pub fn total(&self) -> f64 {
        self.decision_tree + self.boosting
    }

    pub fn validate(&self) -> Result<()> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if !valid(self.decision_tree) || !valid(self.boosting) {
            return Err(ClassifierError::InvalidConfig(format!(
                "ensemble weights must be finite and non-negative, got ({}, {})",
                self.decision_tree, self.boosting
            )));
        }
        if self.total() <= 0.0 {
            return Err(ClassifierError::InvalidConfig(
                "ensemble weights must have a positive sum".to_string(),
            ));
        }
        Ok(())
    }
}

/// Central configuration for the voting ensemble and both base learners.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EnsembleConfig {
    pub decision_tree: DecisionTreeParams,
    pub boosting: BoostingParams,
    pub weights: EnsembleWeights,
}

impl EnsembleConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        let b = &self.boosting;
        if b.num_boost_round == 0 {
            return Err(ClassifierError::InvalidConfig(
                "num_boost_round must be at least 1".to_string(),
            ));
        }
        if !(b.learning_rate.is_finite() && b.learning_rate > 0.0) {
            return Err(ClassifierError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                b.learning_rate
            )));
        }
        for (name, value) in [("subsample", b.subsample), ("colsample_bytree", b.colsample_bytree)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ClassifierError::InvalidConfig(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if b.min_child_weight < 0.0 || b.lambda < 0.0 {
            return Err(ClassifierError::InvalidConfig(
                "min_child_weight and lambda must be non-negative".to_string(),
            ));
        }
        if self.decision_tree.min_samples_leaf == 0 {
            return Err(ClassifierError::InvalidConfig(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
