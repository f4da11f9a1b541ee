//! End-to-end tests: train, persist, reload and predict.

mod common;

use std::sync::Arc;

use common::assert_normalized;
use ecoloc_classifiers::io::{load_pipeline, read_dataset_from_reader, save_pipeline};
use ecoloc_classifiers::{
    ClassSet, ClassifierError, EnsembleConfig, Evaluator, FeatureVector, Label, PipelineCache,
    Predictor, TrainedPipeline,
};

#[test]
fn train_save_reload_predicts_identically() {
    let _ = env_logger::builder().is_test(true).try_init();
    let ds = common::synthetic_dataset(100, 42);
    let (train, test) = ds.train_test_split(0.2, 42).unwrap();
    assert_eq!(test.len(), 20);

    let pipeline = TrainedPipeline::fit(&train, &EnsembleConfig::default()).unwrap();
    let report = Evaluator::new(&pipeline).evaluate(&test).unwrap();
    assert!(report.accuracy >= 0.9, "accuracy {}", report.accuracy);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    save_pipeline(&path, &pipeline).unwrap();
    let reloaded = load_pipeline(&path).unwrap();

    let before = pipeline.predict_proba(&test.x);
    let after = reloaded.predict_proba(&test.x);
    for (a, b) in before.iter().zip(after.iter()) {
        assert!((a - b).abs() < 1e-6);
    }
    assert_eq!(pipeline.classes(), reloaded.classes());
}

#[test]
fn all_zero_vector_predicts_a_known_class() {
    let ds = common::synthetic_dataset(60, 1);
    let pipeline = Arc::new(TrainedPipeline::fit(&ds, &common::quick_config()).unwrap());
    let predictor = Predictor::new(Arc::clone(&pipeline));

    let prediction = predictor.predict(&FeatureVector::zeros()).unwrap();
    assert!(pipeline.classes().contains(&prediction.label));
    assert_normalized(prediction.distribution.probabilities());
    assert_eq!(
        prediction.distribution.get(&prediction.label).unwrap(),
        prediction.probability
    );
}

#[test]
fn predictor_rejects_non_finite_input() {
    let ds = common::synthetic_dataset(30, 2);
    let pipeline = Arc::new(TrainedPipeline::fit(&ds, &common::quick_config()).unwrap());
    let mut values = [0.5; 7];
    values[6] = f64::INFINITY;
    match Predictor::new(pipeline).predict(&FeatureVector::new(values)) {
        Err(ClassifierError::InvalidFeature { feature, .. }) => assert_eq!(feature, "alm2"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn predictor_rejects_unexpected_class_set() {
    let ds = common::synthetic_dataset(30, 2);
    let pipeline = Arc::new(TrainedPipeline::fit(&ds, &common::quick_config()).unwrap());
    let expected = [Label::from("cp"), Label::from("im"), Label::from("om")];
    let predictor = Predictor::new(pipeline).with_expected_classes(ClassSet::from_labels(expected.iter()));
    match predictor.predict(&FeatureVector::zeros()) {
        Err(ClassifierError::UnknownClass(msg)) => {
            assert!(msg.contains("om"));
            assert!(msg.contains("pp"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn missing_label_column_is_schema_mismatch() {
    let data = "mcg\tgvh\tlip\tchg\taac\talm1\talm2\n0.1\t0.2\t0.48\t0.5\t0.3\t0.3\t0.3\n";
    assert!(matches!(
        read_dataset_from_reader(data.as_bytes(), b'\t'),
        Err(ClassifierError::SchemaMismatch { column }) if column == "class"
    ));
}

#[test]
fn fit_on_empty_split_is_insufficient() {
    let ds = common::synthetic_dataset(10, 3);
    let empty = ds.select(&[]);
    assert!(matches!(
        TrainedPipeline::fit(&empty, &EnsembleConfig::default()),
        Err(ClassifierError::InsufficientData(_))
    ));
}

#[test]
fn cache_loads_once_and_reloads_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    let ds = common::synthetic_dataset(45, 6);
    let small = TrainedPipeline::fit(&ds, &common::quick_config()).unwrap();
    save_pipeline(&path, &small).unwrap();

    let cache = PipelineCache::new(&path);
    assert!(!cache.is_loaded());
    let first = cache.get().unwrap();
    let second = cache.get().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let mut bigger = common::quick_config();
    bigger.boosting.num_boost_round = 35;
    let replacement = TrainedPipeline::fit(&ds, &bigger).unwrap();
    save_pipeline(&path, &replacement).unwrap();

    let third = cache.get().unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.ensemble().boosting().n_rounds(), 35);

    cache.invalidate();
    assert!(!cache.is_loaded());
    let fourth = cache.get().unwrap();
    assert!(!Arc::ptr_eq(&third, &fourth));
    assert_eq!(*third, *fourth);
}

#[test]
fn cache_reports_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let cache = PipelineCache::new(dir.path().join("absent.json"));
    assert!(matches!(cache.get(), Err(ClassifierError::ArtifactLoad { .. })));
    assert!(matches!(cache.predictor(), Err(ClassifierError::ArtifactLoad { .. })));
}
