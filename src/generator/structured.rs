use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ConfigGenerator, GeneratorContext};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuredFormat {
    Yaml,
    Json,
}

pub type ValueTransform = Arc<dyn Fn(&GeneratorContext) -> Result<Value> + Send + Sync>;

/// YAML or JSON document, by default the full context composite.
#[derive(Clone)]
pub struct StructuredGenerator {
    file_name: PathBuf,
    format: StructuredFormat,
    transform: Option<ValueTransform>,
}

impl StructuredGenerator {
    pub fn new(file_name: impl Into<PathBuf>, format: StructuredFormat) -> Self {
        Self {
            file_name: file_name.into(),
            format,
            transform: None,
        }
    }

    pub fn yaml(file_name: impl Into<PathBuf>) -> Self {
        Self::new(file_name, StructuredFormat::Yaml)
    }

    pub fn json(file_name: impl Into<PathBuf>) -> Self {
        Self::new(file_name, StructuredFormat::Json)
    }

    /// Serialize this value instead of the composite.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&GeneratorContext) -> Result<Value> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn format(&self) -> StructuredFormat {
        self.format
    }
}

impl ConfigGenerator for StructuredGenerator {
    fn file_name(&self) -> &Path {
        &self.file_name
    }

    fn render(&self, context: &GeneratorContext) -> Result<Vec<u8>> {
        let document = match &self.transform {
            Some(transform) => transform(context)?,
            None => context.composite()?,
        };
        match self.format {
            StructuredFormat::Yaml => Ok(serde_yaml::to_string(&document)?.into_bytes()),
            StructuredFormat::Json => {
                let mut bytes = serde_json::to_vec_pretty(&document)?;
                bytes.push(b'\n');
                Ok(bytes)
            }
        }
    }
}

impl std::fmt::Debug for StructuredGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredGenerator")
            .field("file_name", &self.file_name)
            .field("format", &self.format)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}
