use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ErrorCode, ErrorExt, LabflowError, Result};

/// Analysis parameters addressed by dotted paths (`reads.samples.0`).
///
/// A numeric segment indexes into an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterRepository {
    root: Value,
}

impl Default for ParameterRepository {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl ParameterRepository {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Load a YAML or JSON parameter file; the extension picks the format.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .to_config_error(format!("Failed to read parameters from {}", path.display()))?;
        let root: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        Ok(Self::new(root))
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        segments(path).try_fold(&self.root, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// A present, non-null value.
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some_and(|v| !v.is_null())
    }

    /// Set `path`, creating intermediate objects as needed.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let parts: Vec<&str> = segments(path).collect();
        let Some((last, parents)) = parts.split_last() else {
            self.root = value.into();
            return Ok(());
        };

        let mut current = &mut self.root;
        for segment in parents {
            current = child_mut(current, segment, path)?;
        }

        match current {
            Value::Object(map) => {
                map.insert(last.to_string(), value.into());
                Ok(())
            }
            Value::Array(items) => match last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(slot) => {
                    *slot = value.into();
                    Ok(())
                }
                None => Err(invalid_path(path)),
            },
            _ => Err(invalid_path(path)),
        }
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let parts: Vec<&str> = segments(path).collect();
        let (last, parents) = parts.split_last()?;

        let mut current = &mut self.root;
        for segment in parents {
            current = match current {
                Value::Object(map) => map.get_mut(*segment)?,
                Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        match current {
            Value::Object(map) => map.remove(*last),
            _ => None,
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

fn child_mut<'a>(value: &'a mut Value, segment: &str, path: &str) -> Result<&'a mut Value> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get_mut(i))
            .ok_or_else(|| invalid_path(path)),
        _ => Err(invalid_path(path)),
    }
}

fn invalid_path(path: &str) -> LabflowError {
    LabflowError::config_with_code(
        ErrorCode::CONFIG_INVALID_VALUE,
        format!("Cannot set parameter '{}': path crosses a non-container value", path),
    )
}
