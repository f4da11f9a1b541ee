//! JSON persistence for `TrainedPipeline`.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::pipeline::TrainedPipeline;

/// Bumped whenever the serialized model layout changes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// On-disk envelope around a trained pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub format_version: u32,
    /// RFC 3339 timestamp of when the artifact was written.
    pub created_at: String,
    pub pipeline: TrainedPipeline,
}

#[derive(Serialize)]
struct PipelineArtifactRef<'a> {
    format_version: u32,
    created_at: String,
    pipeline: &'a TrainedPipeline,
}

#[derive(Deserialize)]
struct ArtifactHeader {
    format_version: u32,
}

/// Write a pipeline artifact, replacing any existing file.
pub fn save_pipeline<P: AsRef<Path>>(path: P, pipeline: &TrainedPipeline) -> Result<()> {
    let path = path.as_ref();
    let artifact = PipelineArtifactRef {
        format_version: ARTIFACT_FORMAT_VERSION,
        created_at: chrono::Utc::now().to_rfc3339(),
        pipeline,
    };
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &artifact)?;
    writer.flush()?;
    log::info!("Saved pipeline artifact to {:?}", path);
    Ok(())
}

/// Read and validate a pipeline artifact.
///
/// Every failure (missing file, corrupt JSON, unknown format version or a
/// structurally invalid pipeline) is reported as `ArtifactLoad`.
pub fn load_pipeline<P: AsRef<Path>>(path: P) -> Result<TrainedPipeline> {
    let path = path.as_ref();
    let fail = |reason: String| ClassifierError::ArtifactLoad {
        path: path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;

    let header: ArtifactHeader =
        serde_json::from_str(&content).map_err(|e| fail(format!("unreadable artifact: {}", e)))?;
    if header.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(fail(format!(
            "unsupported format version {} (expected {})",
            header.format_version, ARTIFACT_FORMAT_VERSION
        )));
    }

    let artifact: PipelineArtifact =
        serde_json::from_str(&content).map_err(|e| fail(format!("corrupt artifact: {}", e)))?;
    artifact.pipeline.validate().map_err(fail)?;

    log::debug!(
        "Loaded pipeline artifact {:?} written at {}",
        path,
        artifact.created_at
    );
    Ok(artifact.pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_artifact_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pipeline(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactLoad { .. }));
    }

    #[test]
    fn garbage_and_future_versions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(matches!(load_pipeline(&garbage), Err(ClassifierError::ArtifactLoad { .. })));

        let future = dir.path().join("future.json");
        std::fs::write(&future, r#"{"format_version": 99, "created_at": "", "pipeline": {}}"#).unwrap();
        match load_pipeline(&future) {
            Err(ClassifierError::ArtifactLoad { reason, .. }) => assert!(reason.contains("99")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
