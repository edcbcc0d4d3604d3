use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{global_config_path, LabflowConfig, PROJECT_CONFIG_FILE};
use crate::error::{common, ErrorCode, ErrorExt, LabflowError, Result};

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variables and the setting each one overrides.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("LABFLOW_LOG_LEVEL", "log_level"),
    ("LABFLOW_ENV_EXECUTABLE", "environment.executable"),
    ("LABFLOW_ENV_ROOTS", "environment.roots"),
    ("LABFLOW_ENV_BASE_NAME", "environment.base_name"),
    ("LABFLOW_ENV_CHANNELS", "environment.default_channels"),
    ("LABFLOW_GIT_EXECUTABLE", "git.executable"),
    ("LABFLOW_GIT_DEPTH", "git.depth"),
    ("LABFLOW_TEMPLATES_DIR", "templates_dir"),
    ("LABFLOW_LINK_MODE", "staging.link_mode"),
    ("LABFLOW_RUN_TIMEOUT_SECS", "run.timeout_secs"),
];

/// Builds a [`LabflowConfig`] from defaults, files and the environment.
#[derive(Clone)]
pub struct ConfigLoader {
    global: Option<PathBuf>,
    project: PathBuf,
    project_required: bool,
    env: EnvLookup,
}

impl ConfigLoader {
    /// Global file in the platform config directory, `./labflow.yml`, and
    /// the process environment.
    pub fn new() -> Self {
        Self {
            global: global_config_path(),
            project: PathBuf::from(PROJECT_CONFIG_FILE),
            project_required: false,
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    pub fn with_global_file(mut self, path: Option<PathBuf>) -> Self {
        self.global = path;
        self
    }

    /// Use this project file instead of `./labflow.yml`. It must exist.
    pub fn with_project_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.project = path.into();
        self.project_required = true;
        self
    }

    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    pub fn load(&self) -> Result<LabflowConfig> {
        let mut merged = serde_yaml::to_value(LabflowConfig::default())?;

        if let Some(global) = &self.global {
            if global.is_file() {
                merge_file(&mut merged, global)?;
            }
        }

        if self.project.is_file() {
            merge_file(&mut merged, &self.project)?;
        } else if self.project_required {
            return Err(common::config_not_found(&self.project));
        }

        self.apply_env(&mut merged)?;

        let config: LabflowConfig = serde_yaml::from_value(merged)
            .map_err(|e| LabflowError::from(e).with_context("Invalid configuration"))?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&self, merged: &mut Value) -> Result<()> {
        let mut problems = Vec::new();
        for (variable, path) in ENV_OVERRIDES {
            let Some(raw) = (self.env)(variable) else {
                continue;
            };
            debug!("{} overrides {}", variable, path);
            match env_value(path, &raw) {
                Ok(value) => set_path(merged, path, value),
                Err(problem) => problems.push(format!("{}: {}", variable, problem)),
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(LabflowError::config_with_code(
                ErrorCode::CONFIG_VALIDATION_FAILED,
                problems.join("; "),
            ))
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("global", &self.global)
            .field("project", &self.project)
            .field("project_required", &self.project_required)
            .finish()
    }
}

fn merge_file(merged: &mut Value, path: &Path) -> Result<()> {
    debug!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)
        .to_config_error(format!("Failed to read {}", path.display()))?;
    let layer: Value = serde_yaml::from_str(&content)
        .map_err(|e| LabflowError::from(e).with_context(path.display()))?;
    deep_merge(merged, layer);
    Ok(())
}

/// Merge `overlay` into `base`; mappings merge key by key, anything else
/// replaces. An empty file (null) changes nothing.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut current = root;
    for segment in path.split('.') {
        if !current.is_mapping() {
            *current = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(map) = current else {
            return;
        };
        current = map
            .entry(Value::String(segment.to_string()))
            .or_insert(Value::Null);
    }
    *current = value;
}

fn env_value(path: &str, raw: &str) -> std::result::Result<Value, String> {
    match path {
        "git.depth" | "run.timeout_secs" => raw
            .trim()
            .parse::<u64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| format!("'{}' is not a whole number", raw)),
        "environment.roots" => Ok(Value::Sequence(
            std::env::split_paths(raw)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| Value::String(p.to_string_lossy().into_owned()))
                .collect(),
        )),
        "environment.default_channels" => Ok(Value::Sequence(
            raw.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| Value::String(c.to_string()))
                .collect(),
        )),
        _ => Ok(Value::String(raw.to_string())),
    }
}
