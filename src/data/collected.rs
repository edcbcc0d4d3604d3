use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Staged files by content type, then sample name. Paths are the staged
/// locations under the workflow directory.
///
/// Setting an existing (type, sample) pair replaces it, so merging the same
/// files twice changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectedDataFiles {
    files: BTreeMap<String, BTreeMap<String, PathBuf>>,
}

impl CollectedDataFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, data_type: &str, sample: &str) -> Option<&Path> {
        self.files
            .get(data_type)
            .and_then(|samples| samples.get(sample))
            .map(PathBuf::as_path)
    }

    pub fn set(&mut self, data_type: &str, sample: &str, path: impl Into<PathBuf>) {
        self.files
            .entry(data_type.to_string())
            .or_default()
            .insert(sample.to_string(), path.into());
    }

    pub fn has(&self, data_type: &str, sample: &str) -> bool {
        self.get(data_type, sample).is_some()
    }

    pub fn remove(&mut self, data_type: &str, sample: &str) -> Option<PathBuf> {
        let samples = self.files.get_mut(data_type)?;
        let removed = samples.remove(sample);
        if samples.is_empty() {
            self.files.remove(data_type);
        }
        removed
    }

    /// Later entries win per (type, sample).
    pub fn merge(&mut self, other: &CollectedDataFiles) {
        for (data_type, samples) in &other.files {
            for (sample, path) in samples {
                self.set(data_type, sample, path.clone());
            }
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn samples(&self, data_type: &str) -> impl Iterator<Item = (&str, &Path)> {
        self.files
            .get(data_type)
            .into_iter()
            .flat_map(|samples| samples.iter().map(|(s, p)| (s.as_str(), p.as_path())))
    }

    /// Every sample that has at least one file, sorted.
    pub fn sample_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .files
            .values()
            .flat_map(|samples| samples.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.files.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Which dataset each sample came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleDatasetMap {
    samples: BTreeMap<String, String>,
}

impl SampleDatasetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sample: impl Into<String>, dataset_id: impl Into<String>) {
        self.samples.insert(sample.into(), dataset_id.into());
    }

    pub fn get(&self, sample: &str) -> Option<&str> {
        self.samples.get(sample).map(String::as_str)
    }

    pub fn merge(&mut self, other: &SampleDatasetMap) {
        self.samples
            .extend(other.samples.iter().map(|(s, d)| (s.clone(), d.clone())));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.samples.iter().map(|(s, d)| (s.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
