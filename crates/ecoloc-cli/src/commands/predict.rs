use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

use ecoloc_classifiers::{ClassSet, FeatureVector, PipelineCache, Prediction};

/// Known localization sites with a readable description.
pub const SITE_DESCRIPTIONS: [(&str, &str); 8] = [
    ("cp", "Cytoplasm"),
    ("im", "Inner membrane without signal sequence"),
    ("imL", "Inner membrane lipoprotein"),
    ("imS", "Inner membrane with cleavable signal sequence"),
    ("imU", "Inner membrane with uncleavable signal sequence"),
    ("om", "Outer membrane"),
    ("omL", "Outer membrane lipoprotein"),
    ("pp", "Periplasm"),
];

pub fn site_description(code: &str) -> Option<&'static str> {
    SITE_DESCRIPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, d)| *d)
}

/// Predict one sample. With `expected_classes`, the artifact must have been
/// trained on exactly those sites or the prediction fails with `UnknownClass`.
pub fn run_prediction(
    model_path: &Path,
    features: &FeatureVector,
    expected_classes: Option<ClassSet>,
) -> Result<Prediction> {
    let cache = PipelineCache::new(model_path);
    let mut predictor = cache.predictor()?;
    if let Some(classes) = expected_classes {
        predictor = predictor.with_expected_classes(classes);
    }
    let prediction = predictor.predict(features)?;
    log::debug!(
        "Predicted {} with probability {:.4}",
        prediction.label,
        prediction.probability
    );
    Ok(prediction)
}

/// Predicted site, the probability table with the maximum marked, and the
/// site descriptions with the predicted site highlighted.
pub fn format_prediction(prediction: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Predicted Localization Site: {}", prediction.label);
    let _ = writeln!(out);
    let _ = writeln!(out, "Prediction Probabilities:");
    for (label, p) in prediction.distribution.iter() {
        let marker = if *label == prediction.label { "  <- max" } else { "" };
        let _ = writeln!(out, "  {:<4} {:.4}{}", label, p, marker);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Location Descriptions:");
    for (code, description) in SITE_DESCRIPTIONS {
        if code == prediction.label.as_str() {
            let _ = writeln!(out, "* {}: {} (predicted)", code, description);
        } else {
            let _ = writeln!(out, "  {}: {}", code, description);
        }
    }
    out
}
