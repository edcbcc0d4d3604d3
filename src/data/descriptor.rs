use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::collected::{CollectedDataFiles, SampleDatasetMap};
use super::dataset::{ContentItem, DataTypeRef, Dataset, DatasetRepository};
use super::parameters::ParameterRepository;
use super::resolver::{PathResolver, ResolveContext};
use super::staging::Stager;
use crate::error::{ErrorCode, LabflowError, Result};

pub type ComputeFn = Arc<dyn Fn(&ParameterRepository) -> Value + Send + Sync>;

/// Where a descriptor finds its dataset identifiers.
#[derive(Clone)]
pub enum DataSource {
    /// One dotted parameter path.
    Path(String),
    /// Several parameter paths; array results are flattened one level.
    Paths(Vec<String>),
    /// Computed from the parameters.
    Computed(ComputeFn),
}

impl DataSource {
    pub fn computed<F>(compute: F) -> Self
    where
        F: Fn(&ParameterRepository) -> Value + Send + Sync + 'static,
    {
        DataSource::Computed(Arc::new(compute))
    }

    /// Evaluate against `parameters`. Absent and null values yield nothing.
    pub fn evaluate(&self, parameters: &ParameterRepository) -> Vec<Value> {
        let lookup = |path: &str| parameters.get(path).cloned().unwrap_or(Value::Null);
        match self {
            DataSource::Path(path) => flatten(lookup(path)),
            DataSource::Paths(paths) => paths.iter().flat_map(|p| flatten(lookup(p))).collect(),
            DataSource::Computed(compute) => flatten(compute(parameters)),
        }
    }
}

fn flatten(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            DataSource::Paths(paths) => f.debug_tuple("Paths").field(paths).finish(),
            DataSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Declares which datasets a workflow needs and which of their content.
#[derive(Debug, Clone)]
pub struct DataDescriptor {
    source: DataSource,
    selector: Vec<DataTypeRef>,
}

impl DataDescriptor {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            selector: Vec::new(),
        }
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self::new(DataSource::Path(path.into()))
    }

    /// Keep only content of this data type. Without any selection all
    /// content is kept.
    pub fn select(mut self, data_type: DataTypeRef) -> Self {
        self.selector.push(data_type);
        self
    }

    pub fn select_all(mut self, data_types: impl IntoIterator<Item = DataTypeRef>) -> Self {
        self.selector.extend(data_types);
        self
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn selector(&self) -> &[DataTypeRef] {
        &self.selector
    }

    pub fn bind<'a>(
        &'a self,
        parameters: &'a ParameterRepository,
        resolver: PathResolver,
    ) -> BoundDataDescriptor<'a> {
        BoundDataDescriptor {
            descriptor: self,
            parameters,
            resolver,
        }
    }
}

/// A dataset and the content of it that matched the selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledDataset {
    pub dataset: Dataset,
    pub contents: Vec<ContentItem>,
}

/// Everything one descriptor staged.
#[derive(Debug, Clone, Default)]
pub struct StagedData {
    pub datasets: Vec<PulledDataset>,
    pub files: CollectedDataFiles,
    pub samples: SampleDatasetMap,
}

/// A descriptor bound to parameters and a path resolver.
pub struct BoundDataDescriptor<'a> {
    descriptor: &'a DataDescriptor,
    parameters: &'a ParameterRepository,
    resolver: PathResolver,
}

impl BoundDataDescriptor<'_> {
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Dataset identifiers named by the parameters.
    pub fn dataset_ids(&self) -> Result<Vec<String>> {
        self.descriptor
            .source
            .evaluate(self.parameters)
            .into_iter()
            .filter_map(|value| dataset_id(value).transpose())
            .collect()
    }

    /// Fetch the datasets and keep the selected content.
    pub async fn pull(&self, repository: &dyn DatasetRepository) -> Result<Vec<PulledDataset>> {
        let ids = self.dataset_ids()?;
        if ids.is_empty() {
            debug!("No datasets selected by {:?}", self.descriptor.source);
            return Ok(Vec::new());
        }

        let datasets = repository.fetch_with_contents(&ids).await?;
        let selected = self.selected_type_ids(repository).await?;

        Ok(datasets
            .into_iter()
            .map(|dataset| {
                let contents = dataset
                    .contents
                    .iter()
                    .filter(|item| {
                        selected
                            .as_ref()
                            .map_or(true, |ids| ids.contains(&item.data_type.id))
                    })
                    .cloned()
                    .collect();
                PulledDataset { dataset, contents }
            })
            .collect())
    }

    /// Selected data type ids; `None` keeps everything. Names are resolved
    /// with one repository call.
    async fn selected_type_ids(
        &self,
        repository: &dyn DatasetRepository,
    ) -> Result<Option<HashSet<String>>> {
        if self.descriptor.selector.is_empty() {
            return Ok(None);
        }

        let mut ids = HashSet::new();
        let mut names = Vec::new();
        for reference in &self.descriptor.selector {
            match reference {
                DataTypeRef::Id(id) => {
                    ids.insert(id.clone());
                }
                DataTypeRef::Name(name) => names.push(name.clone()),
            }
        }

        if !names.is_empty() {
            ids.extend(repository.data_type_ids(&names).await?);
        }
        Ok(Some(ids))
    }

    /// Pull the datasets and link their files into place.
    ///
    /// Content is staged in dataset order. The first file that cannot be
    /// staged aborts the whole pass.
    pub async fn collect(
        &self,
        repository: &dyn DatasetRepository,
        stager: &Stager,
    ) -> Result<StagedData> {
        let datasets = self.pull(repository).await?;
        let mut staged = StagedData::default();

        for pulled in &datasets {
            for item in &pulled.contents {
                for (kind, source) in &item.files {
                    if !self.resolver.supports(kind) {
                        continue;
                    }
                    let context = ResolveContext {
                        data_type: kind,
                        source,
                        content: item,
                        dataset: &pulled.dataset,
                    };
                    let Some(destination) = self.resolver.resolve(&context) else {
                        debug!("Not staging {} for sample {}", kind, item.name);
                        continue;
                    };

                    let staged_path = stager.stage(source, &destination)?;
                    staged.files.set(kind, &item.name, staged_path);
                    staged.samples.insert(&item.name, &pulled.dataset.id);
                }
            }
        }

        info!(
            "Staged {} files from {} datasets into {}",
            staged.files.len(),
            datasets.len(),
            stager.root().display()
        );
        staged.datasets = datasets;
        Ok(staged)
    }
}

/// A dataset id from a parameter value: a string, a number or an object with
/// an `id` field. Empty strings are skipped.
fn dataset_id(value: Value) -> Result<Option<String>> {
    match value {
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Object(mut map) => match map.remove("id") {
            Some(id) => dataset_id(id),
            None => Err(invalid_id(&Value::Object(map))),
        },
        other => Err(invalid_id(&other)),
    }
}

fn invalid_id(value: &Value) -> LabflowError {
    LabflowError::config_with_code(
        ErrorCode::CONFIG_INVALID_VALUE,
        format!("Cannot use {} as a dataset identifier", value),
    )
}

impl fmt::Debug for BoundDataDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundDataDescriptor")
            .field("descriptor", self.descriptor)
            .field("resolver", &self.resolver)
            .finish()
    }
}
