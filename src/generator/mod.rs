//! Configuration files written into a prepared workflow directory.
//!
//! A [`ConfigGenerator`] turns the [`GeneratorContext`] (parameters, staged
//! files, sample origins and metadata) into one file. Output depends only on
//! the context, so the same inputs always produce the same bytes.

mod registry;
mod structured;
mod table;


pub use registry::{GeneratorEntry, GeneratorFactory, GeneratorRegistry};
pub use structured::{StructuredFormat, StructuredGenerator, ValueTransform};
pub use table::{Table, TableGenerator, TableTransform};

use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::data::{CollectedDataFiles, ParameterRepository, SampleDatasetMap};
use crate::error::{common, ErrorCode, LabflowError, Result};
use crate::metadata::MetadataContainer;

/// Everything a generator may read.
#[derive(Debug, Clone, Default)]
pub struct GeneratorContext {
    pub parameters: ParameterRepository,
    pub files: CollectedDataFiles,
    pub samples: SampleDatasetMap,
    pub metadata: MetadataContainer,
}

impl GeneratorContext {
    pub fn new(parameters: ParameterRepository) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    pub fn with_files(mut self, files: CollectedDataFiles) -> Self {
        self.files = files;
        self
    }

    pub fn with_samples(mut self, samples: SampleDatasetMap) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataContainer) -> Self {
        self.metadata = metadata;
        self
    }

    /// The whole context as one document:
    /// `{parameters, data, samples, metadata}`.
    pub fn composite(&self) -> Result<Value> {
        let mut root = Map::new();
        root.insert("parameters".to_string(), self.parameters.as_value().clone());
        root.insert("data".to_string(), serde_json::to_value(&self.files)?);
        root.insert("samples".to_string(), serde_json::to_value(&self.samples)?);
        root.insert("metadata".to_string(), self.metadata.to_value());
        Ok(Value::Object(root))
    }
}

/// Writes one configuration file for a workflow.
pub trait ConfigGenerator: fmt::Debug + Send + Sync {
    /// Path of the generated file, relative to the workflow directory.
    fn file_name(&self) -> &Path;

    fn render(&self, context: &GeneratorContext) -> Result<Vec<u8>>;

    /// Render and write the file, returning its absolute path.
    fn write(&self, workflow_dir: &Path, context: &GeneratorContext) -> Result<PathBuf> {
        let path = workflow_dir.join(self.file_name());
        let bytes = self.render(context)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| common::directory_failed(parent.to_path_buf()).with_source(e))?;
        }
        std::fs::write(&path, &bytes).map_err(|e| {
            LabflowError::staging_with_code(
                ErrorCode::STAGING_WRITE_FAILED,
                format!("Failed to write {}", path.display()),
                Some(path.clone()),
            )
            .with_source(e)
        })?;

        info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
