//! Integration tests for the evaluator and its output tables.

mod common;

use ecoloc_classifiers::evaluation::OVERALL_ROW;
use ecoloc_classifiers::io::{write_results, write_summary};
use ecoloc_classifiers::report::{format_classification_report, format_evaluation_summary};
use ecoloc_classifiers::{
    ClassifierError, Evaluator, Label, LabeledDataset, Predictor, TrainedPipeline,
};
use std::sync::Arc;
use ndarray::Array2;

#[test]
fn accuracy_is_fraction_of_matching_records() {
    let train = common::synthetic_dataset(60, 10);
    let pipeline = TrainedPipeline::fit(&train, &common::quick_config()).unwrap();

    // Relabel a third of the samples so some predictions miss.
    let mut eval = common::synthetic_dataset(30, 77);
    for label in eval.labels.iter_mut().take(10) {
        *label = Label::from("im");
    }
    let report = Evaluator::new(&pipeline).evaluate(&eval).unwrap();

    let matches = report.records.iter().filter(|r| r.is_match).count();
    assert_eq!(report.correct(), matches);
    assert!((report.accuracy - matches as f64 / 30.0).abs() < 1e-12);
    for record in &report.records {
        assert_eq!(record.is_match, record.actual == record.predicted);
        assert!(record.probability > 0.0 && record.probability <= 1.0);
    }

    let overall = report.summary.overall().unwrap();
    assert_eq!(overall.class, OVERALL_ROW);
    assert_eq!(overall.precision, report.accuracy);
    assert_eq!(overall.recall, report.accuracy);
}

#[test]
fn class_missing_from_training_scores_zero() {
    let train = common::synthetic_dataset(45, 12);
    let pipeline = TrainedPipeline::fit(&train, &common::quick_config()).unwrap();

    let mut eval = common::synthetic_dataset(9, 13);
    eval.labels[0] = Label::from("omL");
    let report = Evaluator::new(&pipeline).evaluate(&eval).unwrap();

    let oml = report
        .metrics
        .iter()
        .find(|m| m.class.as_str() == "omL")
        .unwrap();
    assert_eq!(oml.precision, 0.0);
    assert_eq!(oml.recall, 0.0);
    assert_eq!(oml.support, 1);
    assert!(!report.records[0].is_match);
}

#[test]
fn evaluator_agrees_with_single_sample_predictor() {
    let train = common::synthetic_dataset(45, 21);
    let pipeline = TrainedPipeline::fit(&train, &common::quick_config()).unwrap();
    let eval = common::synthetic_dataset(12, 22);
    let report = Evaluator::new(&pipeline).evaluate(&eval).unwrap();

    let predictor = Predictor::new(Arc::new(pipeline));
    for (i, record) in report.records.iter().enumerate() {
        let prediction = predictor.predict(&eval.feature_vector(i)).unwrap();
        assert_eq!(record.predicted, prediction.label);
        assert_eq!(record.probability, prediction.probability);
    }
}

#[test]
fn empty_dataset_is_insufficient() {
    let train = common::synthetic_dataset(30, 14);
    let pipeline = TrainedPipeline::fit(&train, &common::quick_config()).unwrap();
    let empty = LabeledDataset::new(Array2::zeros((0, 7)), Vec::new()).unwrap();
    assert!(matches!(
        Evaluator::new(&pipeline).evaluate(&empty),
        Err(ClassifierError::InsufficientData(_))
    ));
}

#[test]
fn tables_and_reports_are_written() {
    let ds = common::synthetic_dataset(45, 15);
    let pipeline = TrainedPipeline::fit(&ds, &common::quick_config()).unwrap();
    let report = Evaluator::new(&pipeline).evaluate(&ds).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results.tsv");
    let summary = dir.path().join("summary.csv");
    write_results(&results, &report.records).unwrap();
    write_summary(&summary, &report.summary).unwrap();

    let results_text = std::fs::read_to_string(&results).unwrap();
    assert_eq!(results_text.lines().count(), 46);
    assert!(results_text.starts_with("MCG\tGVH\tLIP"));

    let summary_text = std::fs::read_to_string(&summary).unwrap();
    assert!(summary_text.lines().last().unwrap().starts_with("Overall,"));

    let printed = format_evaluation_summary(&report);
    assert!(printed.contains("Total samples: 45"));
    let classification = format_classification_report(&report.metrics, report.accuracy);
    assert!(classification.contains("weighted avg"));
}
