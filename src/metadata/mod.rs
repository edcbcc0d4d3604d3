//! Sample × variable metadata used to fill in workflow configuration.
//!
//! Values are stored per variable (`variable → sample → value`). The
//! per-sample view and the distinct values of each variable are computed on
//! first use and dropped whenever the container changes.

mod table;


pub use table::cell_text;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type SampleValues = IndexMap<String, Value>;

/// Addresses a variable or sample by name or by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaKey {
    Name(String),
    Index(usize),
}

impl From<&str> for MetaKey {
    fn from(name: &str) -> Self {
        MetaKey::Name(name.to_string())
    }
}

impl From<String> for MetaKey {
    fn from(name: String) -> Self {
        MetaKey::Name(name)
    }
}

impl From<usize> for MetaKey {
    fn from(index: usize) -> Self {
        MetaKey::Index(index)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataContainer {
    variables: IndexMap<String, SampleValues>,
    #[serde(skip)]
    by_sample: OnceCell<IndexMap<String, SampleValues>>,
    #[serde(skip)]
    distinct: OnceCell<IndexMap<String, Vec<Value>>>,
}

impl PartialEq for MetadataContainer {
    fn eq(&self, other: &Self) -> bool {
        self.variables == other.variables
    }
}

impl MetadataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_variables(variables: IndexMap<String, SampleValues>) -> Self {
        Self {
            variables,
            ..Self::default()
        }
    }

    fn invalidate(&mut self) {
        self.by_sample = OnceCell::new();
        self.distinct = OnceCell::new();
    }

    /// Variable names in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Sample names: the union over all variables, in first-seen order.
    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.sample_view().keys().map(String::as_str)
    }

    pub fn count_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn count_samples(&self) -> usize {
        self.sample_view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn sample_view(&self) -> &IndexMap<String, SampleValues> {
        self.by_sample.get_or_init(|| {
            let mut view: IndexMap<String, SampleValues> = IndexMap::new();
            for samples in self.variables.values() {
                for sample in samples.keys() {
                    view.entry(sample.clone()).or_default();
                }
            }
            for (sample, row) in view.iter_mut() {
                for (variable, samples) in &self.variables {
                    let value = samples.get(sample).cloned().unwrap_or(Value::Null);
                    row.insert(variable.clone(), value);
                }
            }
            view
        })
    }

    fn variable_name(&self, key: &MetaKey) -> Option<&str> {
        match key {
            MetaKey::Name(name) => self.variables.get_key_value(name).map(|(k, _)| k.as_str()),
            MetaKey::Index(index) => self.variables.get_index(*index).map(|(k, _)| k.as_str()),
        }
    }

    fn sample_name(&self, key: &MetaKey) -> Option<&str> {
        let view = self.sample_view();
        match key {
            MetaKey::Name(name) => view.get_key_value(name).map(|(k, _)| k.as_str()),
            MetaKey::Index(index) => view.get_index(*index).map(|(k, _)| k.as_str()),
        }
    }

    /// Values of one variable by sample.
    pub fn variable(&self, key: impl Into<MetaKey>) -> Option<&SampleValues> {
        let name = self.variable_name(&key.into())?;
        self.variables.get(name)
    }

    /// Values of one sample by variable; variables without a value for the
    /// sample hold null.
    pub fn sample(&self, key: impl Into<MetaKey>) -> Option<&SampleValues> {
        let name = self.sample_name(&key.into())?.to_string();
        self.sample_view().get(&name)
    }

    pub fn value(&self, variable: impl Into<MetaKey>, sample: impl Into<MetaKey>) -> Option<&Value> {
        let sample = self.sample_name(&sample.into())?.to_string();
        self.variable(variable)?.get(&sample)
    }

    /// Look up by variable, sample, both or neither.
    ///
    /// - neither: the whole matrix as `variable → sample → value`
    /// - variable only: `sample → value`
    /// - sample only: `variable → value`, null where the sample has no value
    /// - both: the single value, null when the sample lacks it
    ///
    /// `None` when a named variable or sample does not exist.
    pub fn get(&self, variable: Option<MetaKey>, sample: Option<MetaKey>) -> Option<Value> {
        match (variable, sample) {
            (None, None) => Some(self.to_value()),
            (Some(variable), None) => self.variable(variable).map(values_to_json),
            (None, Some(sample)) => self.sample(sample).map(values_to_json),
            (Some(variable), Some(sample)) => {
                let sample = self.sample_name(&sample)?.to_string();
                let values = self.variable(variable)?;
                Some(values.get(&sample).cloned().unwrap_or(Value::Null))
            }
        }
    }

    /// Distinct values of a variable in first-seen order.
    pub fn variable_values(&self, key: impl Into<MetaKey>) -> Option<&[Value]> {
        let name = self.variable_name(&key.into())?.to_string();
        let distinct = self.distinct.get_or_init(|| {
            self.variables
                .iter()
                .map(|(variable, samples)| {
                    let mut values: Vec<Value> = Vec::new();
                    for value in samples.values() {
                        if !values.contains(value) {
                            values.push(value.clone());
                        }
                    }
                    (variable.clone(), values)
                })
                .collect()
        });
        distinct.get(&name).map(Vec::as_slice)
    }

    pub fn has(&self, variable: &str, sample: Option<&str>) -> bool {
        match (self.variables.get(variable), sample) {
            (Some(values), Some(sample)) => values.contains_key(sample),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn set(&mut self, variable: &str, sample: &str, value: impl Into<Value>) {
        self.variables
            .entry(variable.to_string())
            .or_default()
            .insert(sample.to_string(), value.into());
        self.invalidate();
    }

    /// Remove one value, or a whole variable when `sample` is `None`.
    pub fn remove(&mut self, variable: &str, sample: Option<&str>) -> Option<Value> {
        let removed = match sample {
            None => self
                .variables
                .shift_remove(variable)
                .map(|values| values_to_json(&values)),
            Some(sample) => {
                let values = self.variables.get_mut(variable)?;
                let removed = values.shift_remove(sample);
                if values.is_empty() {
                    self.variables.shift_remove(variable);
                }
                removed
            }
        };
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    /// Union of both containers; values from `other` win.
    pub fn merge(&mut self, other: &MetadataContainer) {
        for (variable, samples) in &other.variables {
            let target = self.variables.entry(variable.clone()).or_default();
            for (sample, value) in samples {
                target.insert(sample.clone(), value.clone());
            }
        }
        self.invalidate();
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.variables
                .iter()
                .map(|(variable, samples)| (variable.clone(), values_to_json(samples)))
                .collect::<Map<String, Value>>(),
        )
    }
}

fn values_to_json(values: &SampleValues) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Map<String, Value>>(),
    )
}
