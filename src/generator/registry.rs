use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::{ConfigGenerator, StructuredGenerator, TableGenerator};
use crate::error::{ErrorCode, LabflowError, Result};

/// One generator as written in a workflow manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorEntry {
    /// Registry key, e.g. `sample_sheet`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Output path relative to the workflow directory.
    pub file: PathBuf,
    /// Field delimiter for tables: a single character, `tab` or `comma`.
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default = "default_header")]
    pub header: bool,
}

fn default_header() -> bool {
    true
}

impl GeneratorEntry {
    pub fn new(kind: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            kind: kind.into(),
            file: file.into(),
            delimiter: None,
            header: true,
        }
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        let Some(delimiter) = self.delimiter.as_deref() else {
            return Ok(None);
        };
        match delimiter {
            "tab" | "\t" => Ok(Some(b'\t')),
            "comma" => Ok(Some(b',')),
            single if single.len() == 1 && single.is_ascii() => Ok(Some(single.as_bytes()[0])),
            other => Err(LabflowError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("Invalid delimiter '{}' for {}", other, self.file.display()),
            )),
        }
    }
}

pub type GeneratorFactory =
    Arc<dyn Fn(&GeneratorEntry) -> Result<Arc<dyn ConfigGenerator>> + Send + Sync>;

/// Generator factories keyed by stable names.
#[derive(Clone)]
pub struct GeneratorRegistry {
    factories: HashMap<String, GeneratorFactory>,
}

impl GeneratorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// `table` (metadata matrix), `sample_sheet`, `yaml` and `json`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("table", |entry| {
            Ok(Arc::new(configure_table(
                TableGenerator::metadata(&entry.file),
                entry,
            )?))
        });
        registry.register("sample_sheet", |entry| {
            Ok(Arc::new(configure_table(
                TableGenerator::sample_sheet(&entry.file),
                entry,
            )?))
        });
        registry.register("yaml", |entry| Ok(Arc::new(StructuredGenerator::yaml(&entry.file))));
        registry.register("json", |entry| Ok(Arc::new(StructuredGenerator::json(&entry.file))));
        registry
    }

    /// Register a factory, replacing any previous one under the same key.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&GeneratorEntry) -> Result<Arc<dyn ConfigGenerator>> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Arc::new(factory));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn build(&self, entry: &GeneratorEntry) -> Result<Arc<dyn ConfigGenerator>> {
        let factory = self.factories.get(&entry.kind).ok_or_else(|| {
            LabflowError::not_found(
                ErrorCode::NOT_FOUND_GENERATOR,
                format!(
                    "No config generator registered as '{}' (known: {})",
                    entry.kind,
                    self.keys().join(", ")
                ),
            )
        })?;
        factory(entry)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

fn configure_table(generator: TableGenerator, entry: &GeneratorEntry) -> Result<TableGenerator> {
    let generator = generator.with_header(entry.header);
    Ok(match entry.delimiter_byte()? {
        Some(delimiter) => generator.with_delimiter(delimiter),
        None => generator,
    })
}
