use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the classification pipeline and its IO helpers.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// A fit was attempted on empty or degenerate input.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A dataset is missing one of the required columns.
    #[error("Schema mismatch: missing required column '{column}'")]
    SchemaMismatch { column: String },

    /// A dataset row holds a value that cannot be used as-is.
    #[error("Malformed record at row {row}, column '{column}': {message}")]
    MalformedRecord {
        row: usize,
        column: String,
        message: String,
    },

    /// The persisted pipeline is missing, corrupt or version-incompatible.
    #[error("Failed to load pipeline artifact {path:?}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    /// A class outside the trained class set was referenced.
    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    /// A single input feature vector cannot be scored.
    #[error("Invalid feature '{feature}': {message}")]
    InvalidFeature { feature: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
