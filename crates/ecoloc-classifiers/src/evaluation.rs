//! Read-only scoring of a trained pipeline against a labeled dataset.
//!
//! Per-class precision/recall follow the zero-division convention of
//! returning 0 for a class with no predicted (precision) or actual (recall)
//! members. The summary carries the accuracy twice in a trailing
//! "Overall" row so its shape matches the historical `pr_summary` table.
use serde::Serialize;

use crate::data_handling::{ClassSet, FeatureVector, Label, LabeledDataset};
use crate::error::{ClassifierError, Result};
use crate::pipeline::TrainedPipeline;

/// Name of the synthetic accuracy row in `PrecisionRecallSummary`.
pub const OVERALL_ROW: &str = "Overall";

/// Outcome for one evaluated sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub features: FeatureVector,
    pub actual: Label,
    pub predicted: Label,
    /// Probability the ensemble assigned to `predicted`.
    pub probability: f64,
    pub is_match: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecisionRecallRow {
    pub class: String,
    pub precision: f64,
    pub recall: f64,
}

/// One row per class plus the "Overall" row holding accuracy in both columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecisionRecallSummary {
    pub rows: Vec<PrecisionRecallRow>,
}

impl PrecisionRecallSummary {
    pub fn new(metrics: &[ClassMetrics], accuracy: f64) -> Self {
        let mut rows: Vec<PrecisionRecallRow> = metrics
            .iter()
            .map(|m| PrecisionRecallRow {
                class: m.class.to_string(),
                precision: m.precision,
                recall: m.recall,
            })
            .collect();
        rows.push(PrecisionRecallRow {
            class: OVERALL_ROW.to_string(),
            precision: accuracy,
            recall: accuracy,
        });
        PrecisionRecallSummary { rows }
    }

    pub fn class_rows(&self) -> &[PrecisionRecallRow] {
        &self.rows[..self.rows.len().saturating_sub(1)]
    }

    pub fn overall(&self) -> Option<&PrecisionRecallRow> {
        self.rows.last().filter(|r| r.class == OVERALL_ROW)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub records: Vec<EvaluationRecord>,
    pub metrics: Vec<ClassMetrics>,
    pub summary: PrecisionRecallSummary,
    pub accuracy: f64,
}

impl EvaluationReport {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn correct(&self) -> usize {
        self.records.iter().filter(|r| r.is_match).count()
    }

    pub fn misclassified(&self) -> impl Iterator<Item = (usize, &EvaluationRecord)> + '_ {
        self.records.iter().enumerate().filter(|(_, r)| !r.is_match)
    }
}

fn safe_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Precision, recall, f1 and support for each class in `classes`.
pub fn class_metrics(classes: &[Label], actual: &[Label], predicted: &[Label]) -> Vec<ClassMetrics> {
    assert_eq!(actual.len(), predicted.len(), "actual and predicted must align");
    classes
        .iter()
        .map(|class| {
            let mut tp = 0;
            let mut fp = 0;
            let mut fn_ = 0;
            for (a, p) in actual.iter().zip(predicted.iter()) {
                match (a == class, p == class) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let precision = safe_ratio(tp, tp + fp);
            let recall = safe_ratio(tp, tp + fn_);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                class: class.clone(),
                precision,
                recall,
                f1,
                support: tp + fn_,
            }
        })
        .collect()
}

/// Fraction of records whose prediction matches the actual label.
pub fn accuracy(records: &[EvaluationRecord]) -> f64 {
    safe_ratio(records.iter().filter(|r| r.is_match).count(), records.len())
}

/// Batch evaluator borrowing an immutable pipeline.
pub struct Evaluator<'a> {
    pipeline: &'a TrainedPipeline,
}

impl<'a> Evaluator<'a> {
    pub fn new(pipeline: &'a TrainedPipeline) -> Self {
        Evaluator { pipeline }
    }

    pub fn evaluate(&self, dataset: &LabeledDataset) -> Result<EvaluationReport> {
        if dataset.is_empty() {
            return Err(ClassifierError::InsufficientData(
                "cannot evaluate an empty dataset".to_string(),
            ));
        }

        let classes = self.pipeline.classes();
        let dataset_classes = dataset.class_set();
        let unseen: Vec<&str> = dataset_classes
            .iter()
            .filter(|l| !classes.contains(l))
            .map(Label::as_str)
            .collect();
        if !unseen.is_empty() {
            log::warn!(
                "Dataset contains classes the pipeline was not trained on: {}",
                unseen.join(", ")
            );
        }

        let records = (0..dataset.len())
            .map(|i| -> Result<EvaluationRecord> {
                let features = dataset.feature_vector(i);
                let distribution = self.pipeline.predict_distribution(&features)?;
                let (predicted, probability) = distribution.most_probable();
                let predicted = predicted.clone();
                let actual = dataset.labels[i].clone();
                Ok(EvaluationRecord {
                    features,
                    is_match: predicted == actual,
                    actual,
                    predicted,
                    probability,
                })
            })
            .collect::<Result<Vec<EvaluationRecord>>>()?;

        let known = ClassSet::from_labels(classes.iter().chain(dataset.labels.iter()));
        let actual: Vec<Label> = records.iter().map(|r| r.actual.clone()).collect();
        let predicted: Vec<Label> = records.iter().map(|r| r.predicted.clone()).collect();
        let metrics = class_metrics(known.labels(), &actual, &predicted);

        let accuracy = accuracy(&records);
        let summary = PrecisionRecallSummary::new(&metrics, accuracy);

        log::info!(
            "Evaluated {} samples: accuracy {:.4}",
            records.len(),
            accuracy
        );
        Ok(EvaluationReport {
            records,
            metrics,
            summary,
            accuracy,
        })
    }
}
