//! IO utilities for datasets, pipeline artifacts and evaluation tables.

pub mod artifact;
pub mod dataset;
pub mod results;

pub use artifact::{load_pipeline, save_pipeline, PipelineArtifact, ARTIFACT_FORMAT_VERSION};
pub use dataset::{read_dataset, read_dataset_from_reader};
pub use results::{write_results, write_summary};

use std::path::Path;

/// Tab for `.tsv` paths, comma otherwise.
pub fn delimiter_for<P: AsRef<Path>>(path: P) -> u8 {
    match path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") => b'\t',
        _ => b',',
    }
}
