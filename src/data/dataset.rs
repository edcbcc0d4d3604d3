use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ErrorCode, ErrorExt, LabflowError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    pub id: String,
    pub name: String,
}

/// Selects content by data type, either by id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTypeRef {
    Id(String),
    Name(String),
}

/// One sample's content within a dataset.
///
/// `files` maps a file kind (`fastq`, `bam`, `bai`, ...) to the absolute path
/// of the stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub files: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contents: Vec<ContentItem>,
}

/// Read access to stored datasets.
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Datasets with their content loaded, in the order of `ids`.
    async fn fetch_with_contents(&self, ids: &[String]) -> Result<Vec<Dataset>>;

    /// Resolve data type names to ids in a single lookup.
    async fn data_type_ids(&self, names: &[String]) -> Result<Vec<String>>;
}

/// A dataset catalog held in memory, typically loaded from a YAML or JSON file.
#[derive(Debug, Default)]
pub struct InMemoryDatasetRepository {
    data_types: Vec<DataType>,
    datasets: Vec<Dataset>,
    name_lookups: AtomicUsize,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    data_types: Vec<DataType>,
    #[serde(default)]
    datasets: Vec<CatalogDataset>,
}

#[derive(Debug, Deserialize)]
struct CatalogDataset {
    id: String,
    name: String,
    #[serde(default)]
    contents: Vec<CatalogContent>,
}

#[derive(Debug, Deserialize)]
struct CatalogContent {
    name: String,
    /// Data type id or name
    data_type: String,
    #[serde(default)]
    files: BTreeMap<String, PathBuf>,
}

impl InMemoryDatasetRepository {
    pub fn new(data_types: Vec<DataType>, datasets: Vec<Dataset>) -> Self {
        Self {
            data_types,
            datasets,
            name_lookups: AtomicUsize::new(0),
        }
    }

    /// Load a catalog file. Relative file paths are taken relative to the
    /// catalog's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .to_config_error(format!("Failed to read dataset catalog {}", path.display()))?;
        let catalog: Catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_catalog(catalog, base)
    }

    fn from_catalog(catalog: Catalog, base: &Path) -> Result<Self> {
        let mut datasets = Vec::with_capacity(catalog.datasets.len());
        for dataset in catalog.datasets {
            let mut contents = Vec::with_capacity(dataset.contents.len());
            for item in dataset.contents {
                let data_type = catalog
                    .data_types
                    .iter()
                    .find(|t| t.id == item.data_type || t.name == item.data_type)
                    .cloned()
                    .ok_or_else(|| unknown_data_type(&item.data_type))?;
                let files = item
                    .files
                    .into_iter()
                    .map(|(kind, file)| (kind, base.join(file)))
                    .collect();
                contents.push(ContentItem {
                    name: item.name,
                    data_type,
                    files,
                });
            }
            datasets.push(Dataset {
                id: dataset.id,
                name: dataset.name,
                contents,
            });
        }
        Ok(Self::new(catalog.data_types, datasets))
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// How many name lookups have been made.
    pub fn name_lookups(&self) -> usize {
        self.name_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatasetRepository for InMemoryDatasetRepository {
    async fn fetch_with_contents(&self, ids: &[String]) -> Result<Vec<Dataset>> {
        ids.iter()
            .map(|id| {
                self.datasets
                    .iter()
                    .find(|d| &d.id == id)
                    .cloned()
                    .ok_or_else(|| {
                        LabflowError::not_found(
                            ErrorCode::NOT_FOUND_GENERIC,
                            format!("Dataset '{}' does not exist", id),
                        )
                    })
            })
            .collect()
    }

    async fn data_type_ids(&self, names: &[String]) -> Result<Vec<String>> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        names
            .iter()
            .map(|name| {
                self.data_types
                    .iter()
                    .find(|t| &t.name == name)
                    .map(|t| t.id.clone())
                    .ok_or_else(|| unknown_data_type(name))
            })
            .collect()
    }
}

fn unknown_data_type(reference: &str) -> LabflowError {
    LabflowError::not_found(
        ErrorCode::NOT_FOUND_DATA_TYPE,
        format!("Unknown data type '{}'", reference),
    )
}
