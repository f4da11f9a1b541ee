#![allow(dead_code)]

use ecoloc_classifiers::{EnsembleConfig, Label, LabeledDataset, N_FEATURES};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Class centers on the unit cube, well separated in every feature.
const CENTERS: [(&str, f64); 3] = [("cp", 0.2), ("im", 0.5), ("pp", 0.8)];

/// `n` samples spread evenly over three tight clusters.
pub fn synthetic_dataset(n: usize, seed: u64) -> LabeledDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut labels = Vec::with_capacity(n);
    let x = Array2::from_shape_fn((n, N_FEATURES), |(r, _)| {
        let (_, center) = CENTERS[r % CENTERS.len()];
        center + rng.gen_range(-0.05..0.05)
    });
    for r in 0..n {
        labels.push(Label::from(CENTERS[r % CENTERS.len()].0));
    }
    LabeledDataset::new(x, labels).unwrap()
}

/// Smaller ensemble for tests that only need a fitted pipeline.
pub fn quick_config() -> EnsembleConfig {
    let mut cfg = EnsembleConfig::default();
    cfg.boosting.num_boost_round = 20;
    cfg.boosting.max_depth = 4;
    cfg
}

pub fn assert_normalized(p: &[f64]) {
    let total: f64 = p.iter().sum();
    assert!((total - 1.0).abs() < 1e-6, "distribution sums to {}", total);
    assert!(p.iter().all(|v| (0.0..=1.0 + 1e-12).contains(v)), "{:?}", p);
}
