use serde::{Deserialize, Serialize};

use crate::data_handling::{ClassSet, Label};
use crate::error::{ClassifierError, Result};

/// Tolerance used when checking that a distribution sums to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Index of the largest value; ties resolve to the lowest index.
///
/// Combined with the sorted `ClassSet`, the earliest class in sorted order
/// wins a tie.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = idx;
        }
    }
    best
}

/// Normalize raw class scores into probabilities in place.
pub fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter_mut().for_each(|v| *v /= total);
    } else if !values.is_empty() {
        let uniform = 1.0 / values.len() as f64;
        values.iter_mut().for_each(|v| *v = uniform);
    }
}

/// Numerically stable softmax of per-class scores.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    normalize(&mut exp);
    exp
}

/// Probability per class of a closed class set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilityDistribution {
    classes: ClassSet,
    probabilities: Vec<f64>,
}

impl ClassProbabilityDistribution {
    pub fn new(classes: ClassSet, probabilities: Vec<f64>) -> Result<Self> {
        if classes.len() != probabilities.len() {
            return Err(ClassifierError::UnknownClass(format!(
                "distribution has {} values for {} classes",
                probabilities.len(),
                classes.len()
            )));
        }
        Ok(Self {
            classes,
            probabilities,
        })
    }

    pub fn classes(&self) -> &ClassSet {
        &self.classes
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn get(&self, label: &Label) -> Result<f64> {
        self.classes
            .index_of(label)
            .map(|idx| self.probabilities[idx])
            .ok_or_else(|| ClassifierError::UnknownClass(label.to_string()))
    }

    /// Most probable class and its probability.
    pub fn most_probable(&self) -> (&Label, f64) {
        let idx = argmax(&self.probabilities);
        (self.classes.label(idx), self.probabilities[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, f64)> + '_ {
        self.classes.iter().zip(self.probabilities.iter().copied())
    }

    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// Non-negative values summing to one within `PROBABILITY_TOLERANCE`.
    pub fn is_normalized(&self) -> bool {
        self.probabilities.iter().all(|p| *p >= 0.0 && p.is_finite())
            && (self.total() - 1.0).abs() <= PROBABILITY_TOLERANCE
    }
}
