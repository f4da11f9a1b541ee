//! Data structures for labeled localization datasets.
//!
//! This module defines the fixed seven-score `FeatureVector`, the `Label`
//! newtype, the sorted `ClassSet` used to encode labels as indices, and
//! `LabeledDataset` with the seeded train/test split used for training.
use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Number of signal scores per protein.
pub const N_FEATURES: usize = 7;

/// Feature column names, in the order every model expects them.
pub const FEATURE_NAMES: [&str; N_FEATURES] = ["mcg", "gvh", "lip", "chg", "aac", "alm1", "alm2"];

/// Name of the label column in tabular datasets.
pub const LABEL_COLUMN: &str = "class";

/// The seven biochemical signal scores of one protein.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; N_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; N_FEATURES]) -> Self {
        FeatureVector(values)
    }

    pub fn zeros() -> Self {
        FeatureVector([0.0; N_FEATURES])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Reject NaN or infinite scores, naming the offending feature.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.0.iter()) {
            if !value.is_finite() {
                return Err(ClassifierError::InvalidFeature {
                    feature: name.to_string(),
                    message: format!("value {} is not finite", value),
                });
            }
        }
        Ok(())
    }
}

impl From<[f64; N_FEATURES]> for FeatureVector {
    fn from(values: [f64; N_FEATURES]) -> Self {
        FeatureVector(values)
    }
}

/// A localization site code such as `cp` or `imU`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(code: impl Into<String>) -> Self {
        Label(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label(value.to_string())
    }
}

/// The closed set of classes a model was trained on.
///
/// Classes are kept sorted; that order is the tie-breaking order for every
/// argmax in the crate (the earliest class wins). A deserialized set that is
/// not strictly ascending is rejected rather than re-sorted, since the model
/// columns are aligned to the stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClassSetRepr")]
pub struct ClassSet {
    classes: Vec<Label>,
}

#[derive(Deserialize)]
struct ClassSetRepr {
    classes: Vec<Label>,
}

impl TryFrom<ClassSetRepr> for ClassSet {
    type Error = String;

    fn try_from(repr: ClassSetRepr) -> std::result::Result<Self, Self::Error> {
        if let Some(pair) = repr.classes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "class set is not sorted and unique: '{}' precedes '{}'",
                pair[0], pair[1]
            ));
        }
        Ok(ClassSet {
            classes: repr.classes,
        })
    }
}

impl ClassSet {
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a Label>,
    {
        let mut classes: Vec<Label> = labels.into_iter().cloned().collect();
        classes.sort();
        classes.dedup();
        ClassSet { classes }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn index_of(&self, label: &Label) -> Option<usize> {
        self.classes.binary_search(label).ok()
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.index_of(label).is_some()
    }

    pub fn label(&self, idx: usize) -> &Label {
        &self.classes[idx]
    }

    pub fn labels(&self) -> &[Label] {
        &self.classes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.classes.iter()
    }

    /// Map labels to class indices, failing on a label outside the set.
    pub fn encode(&self, labels: &[Label]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|l| {
                self.index_of(l)
                    .ok_or_else(|| ClassifierError::UnknownClass(l.to_string()))
            })
            .collect()
    }
}

/// Feature matrix plus aligned labels.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub x: Array2<f64>,
    pub labels: Vec<Label>,
}

impl LabeledDataset {
    pub fn new(x: Array2<f64>, labels: Vec<Label>) -> Result<Self> {
        if x.ncols() != N_FEATURES {
            return Err(ClassifierError::InsufficientData(format!(
                "expected {} feature columns, got {}",
                N_FEATURES,
                x.ncols()
            )));
        }
        if x.nrows() != labels.len() {
            return Err(ClassifierError::InsufficientData(format!(
                "feature matrix has {} rows but {} labels were given",
                x.nrows(),
                labels.len()
            )));
        }
        Ok(LabeledDataset { x, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn feature_vector(&self, row: usize) -> FeatureVector {
        let mut values = [0.0; N_FEATURES];
        for (slot, value) in values.iter_mut().zip(self.x.row(row).iter()) {
            *slot = *value;
        }
        FeatureVector(values)
    }

    pub fn class_set(&self) -> ClassSet {
        ClassSet::from_labels(self.labels.iter())
    }

    /// Number of samples per class, sorted by class.
    pub fn class_counts(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn select(&self, indices: &[usize]) -> LabeledDataset {
        LabeledDataset {
            x: self.x.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }

    /// Split into (train, test) after a seeded shuffle.
    ///
    /// The test split holds `ceil(n * test_size)` rows.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(LabeledDataset, LabeledDataset)> {
        if !(0.0..1.0).contains(&test_size) {
            return Err(ClassifierError::InvalidConfig(format!(
                "test_size must be in [0, 1), got {}",
                test_size
            )));
        }
        let n_samples = self.len();
        let n_test = (n_samples as f64 * test_size).ceil() as usize;
        if n_samples == 0 || n_test >= n_samples {
            return Err(ClassifierError::InsufficientData(format!(
                "cannot split {} samples with test_size {}",
                n_samples, test_size
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(&mut rng);

        let (test_idx, train_idx) = indices.split_at(n_test);
        log::debug!(
            "Split {} samples into {} train / {} test (seed {})",
            n_samples,
            train_idx.len(),
            test_idx.len(),
            seed
        );
        Ok((self.select(train_idx), self.select(test_idx)))
    }

    pub fn log_input_data_summary(&self) {
        log::info!("----- Input Data Summary -----");
        log::info!("{} samples, {} feature scores", self.len(), self.x.ncols());
        for (label, count) in self.class_counts() {
            log::info!("  {:<6} {}", label, count);
        }
        log::info!("-------------------------------");
    }
}
