//! Integration tests for the standard scaler.

mod common;

use ecoloc_classifiers::preprocessing::Scaler;
use ecoloc_classifiers::{FeatureVector, N_FEATURES};
use ndarray::Axis;

#[test]
fn fit_is_deterministic() {
    let ds = common::synthetic_dataset(60, 3);
    let a = Scaler::fit(&ds.x).unwrap();
    let b = Scaler::fit(&ds.x).unwrap();
    assert_eq!(a, b);
}

#[test]
fn transformed_columns_are_standardized() {
    let ds = common::synthetic_dataset(90, 11);
    let scaler = Scaler::fit(&ds.x).unwrap();
    let t = scaler.transform(&ds.x);
    for col in t.axis_iter(Axis(1)) {
        let n = col.len() as f64;
        let mean = col.sum() / n;
        let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9);
        assert!((var - 1.0).abs() < 1e-9);
    }
}

#[test]
fn transform_is_repeatable_and_matches_single_vector_path() {
    let ds = common::synthetic_dataset(30, 5);
    let scaler = Scaler::fit(&ds.x).unwrap();
    let first = scaler.transform(&ds.x);
    let second = scaler.transform(&ds.x);
    assert_eq!(first, second);

    for row in 0..ds.len() {
        let single = scaler.transform_vector(&ds.feature_vector(row));
        let batch: Vec<f64> = first.row(row).to_vec();
        assert_eq!(single.as_slice(), batch.as_slice());
        assert_eq!(scaler.transform_row(ds.x.row(row)), batch);
    }
}

#[test]
fn zero_vector_scales_to_finite_values() {
    let ds = common::synthetic_dataset(30, 9);
    let scaler = Scaler::fit(&ds.x).unwrap();
    let scaled = scaler.transform_vector(&FeatureVector::zeros());
    assert_eq!(scaled.as_slice().len(), N_FEATURES);
    assert!(scaled.as_slice().iter().all(|v| v.is_finite()));
}
