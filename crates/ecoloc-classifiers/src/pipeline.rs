//! The persisted unit: scaler + voting ensemble, plus the single-sample
//! inference path and the load-once artifact cache used by it.
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::EnsembleConfig;
use crate::data_handling::{ClassSet, FeatureVector, Label, LabeledDataset};
use crate::error::{ClassifierError, Result};
use crate::io::artifact::load_pipeline;
use crate::models::distribution::ClassProbabilityDistribution;
use crate::models::voting::VotingEnsemble;
use crate::preprocessing::Scaler;

/// A fitted scaler and the voting ensemble trained on its output.
///
/// Immutable once trained; share it behind an `Arc` for concurrent reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    scaler: Scaler,
    ensemble: VotingEnsemble,
}

impl TrainedPipeline {
    /// Fit the scaler on the full training split, then fit both base
    /// learners on the same scaled split.
    pub fn fit(train: &LabeledDataset, config: &EnsembleConfig) -> Result<Self> {
        config.validate()?;
        if train.is_empty() {
            return Err(ClassifierError::InsufficientData(
                "training split is empty".to_string(),
            ));
        }

        let scaler = Scaler::fit(&train.x)?;
        let x_scaled = scaler.transform(&train.x);

        let mut ensemble = VotingEnsemble::new(config);
        ensemble.fit_labels(&x_scaled, &train.labels)?;

        log::info!(
            "Trained pipeline on {} samples, classes: {}",
            train.len(),
            ensemble
                .classes()
                .iter()
                .map(Label::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(TrainedPipeline { scaler, ensemble })
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn ensemble(&self) -> &VotingEnsemble {
        &self.ensemble
    }

    pub fn classes(&self) -> &ClassSet {
        self.ensemble.classes()
    }

    /// Combined distribution for one raw (unscaled) sample.
    pub fn predict_distribution(&self, vector: &FeatureVector) -> Result<ClassProbabilityDistribution> {
        let scaled = self.scaler.transform_vector(vector);
        let row = ndarray::ArrayView1::from(scaled.as_slice());
        self.ensemble.predict_distribution(row)
    }

    /// Combined class probabilities for raw rows, shape `(n_samples, n_classes)`.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let scaled = self.scaler.transform(x);
        let mut out = Array2::zeros((scaled.nrows(), self.classes().len()));
        for (row, mut out_row) in scaled.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
            for (slot, p) in out_row.iter_mut().zip(self.ensemble.predict_proba_row(row)) {
                *slot = p;
            }
        }
        out
    }

    /// Structural checks applied to pipelines read back from storage.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.scaler.validate()?;
        self.ensemble.validate()
    }
}

/// Output of one interactive prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: Label,
    pub probability: f64,
    pub distribution: ClassProbabilityDistribution,
}

/// Single-sample inference entry point over a shared pipeline.
///
/// This is the only validation layer between raw user input and the
/// ensemble: non-finite scores, a class set differing from the expected one,
/// or an unnormalized distribution all fail with a distinguishable error.
#[derive(Debug, Clone)]
pub struct Predictor {
    pipeline: Arc<TrainedPipeline>,
    expected_classes: Option<ClassSet>,
    source: Option<PathBuf>,
}

impl Predictor {
    pub fn new(pipeline: Arc<TrainedPipeline>) -> Self {
        Predictor {
            pipeline,
            expected_classes: None,
            source: None,
        }
    }

    /// Require every distribution to cover exactly these classes.
    pub fn with_expected_classes(mut self, classes: ClassSet) -> Self {
        self.expected_classes = Some(classes);
        self
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn pipeline(&self) -> &TrainedPipeline {
        &self.pipeline
    }

    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction> {
        vector.validate()?;
        let distribution = self.pipeline.predict_distribution(vector)?;

        let expected = self
            .expected_classes
            .as_ref()
            .unwrap_or_else(|| self.pipeline.classes());
        if distribution.classes() != expected {
            let unexpected: Vec<&str> = distribution
                .classes()
                .iter()
                .chain(expected.iter())
                .filter(|l| !(expected.contains(l) && distribution.classes().contains(l)))
                .map(Label::as_str)
                .collect();
            return Err(ClassifierError::UnknownClass(unexpected.join(", ")));
        }

        if !distribution.is_normalized() {
            return Err(ClassifierError::ArtifactLoad {
                path: self.source.clone().unwrap_or_default(),
                reason: format!(
                    "pipeline produced an unnormalized distribution (sum {})",
                    distribution.total()
                ),
            });
        }

        let (label, probability) = distribution.most_probable();
        let label = label.clone();
        Ok(Prediction {
            label,
            probability,
            distribution,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArtifactFingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

impl ArtifactFingerprint {
    fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|e| ClassifierError::ArtifactLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(ArtifactFingerprint {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct CachedPipeline {
    fingerprint: ArtifactFingerprint,
    pipeline: Arc<TrainedPipeline>,
}

/// Load-once cache for a pipeline artifact.
///
/// The first `get` deserializes the artifact; later calls return the same
/// `Arc` until the file's modification time or length changes, or until
/// `invalidate` is called, after which the next `get` reloads it.
pub struct PipelineCache {
    path: PathBuf,
    entry: Mutex<Option<CachedPipeline>>,
}

impl PipelineCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PipelineCache {
            path: path.into(),
            entry: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<Arc<TrainedPipeline>> {
        let fingerprint = ArtifactFingerprint::of(&self.path)?;
        let mut entry = self.entry.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(cached) = entry.as_ref() {
            if cached.fingerprint == fingerprint {
                return Ok(Arc::clone(&cached.pipeline));
            }
            log::info!("Pipeline artifact {:?} changed on disk, reloading", self.path);
        }

        let pipeline = Arc::new(load_pipeline(&self.path)?);
        *entry = Some(CachedPipeline {
            fingerprint,
            pipeline: Arc::clone(&pipeline),
        });
        Ok(pipeline)
    }

    /// Predictor bound to the currently cached pipeline.
    pub fn predictor(&self) -> Result<Predictor> {
        Ok(Predictor::new(self.get()?).with_source(self.path.clone()))
    }

    pub fn invalidate(&self) {
        let mut entry = self.entry.lock().unwrap_or_else(|e| e.into_inner());
        *entry = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.entry
            .lock()
            .map(|e| e.is_some())
            .unwrap_or(false)
    }
}
