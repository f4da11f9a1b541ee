//! ecoloc-classifiers: protein localization site classification for E. coli.
//!
//! A fitted standard scaler feeds two base learners, a CART decision tree and
//! a softmax gradient boosted tree ensemble, whose class distributions are
//! combined by a fixed weighted soft vote. The scaler and ensemble are
//! persisted together as one `TrainedPipeline` artifact that is reused by
//! evaluation and single-sample prediction.
//!
//! Dataset, artifact and results IO live in `io`; text tables in `report`.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;

pub use config::{BoostingParams, DecisionTreeParams, EnsembleConfig, EnsembleWeights};
pub use data_handling::{ClassSet, FeatureVector, Label, LabeledDataset, FEATURE_NAMES, N_FEATURES};
pub use error::{ClassifierError, Result};
pub use evaluation::{EvaluationReport, Evaluator};
pub use models::distribution::ClassProbabilityDistribution;
pub use pipeline::{PipelineCache, Prediction, Predictor, TrainedPipeline};
