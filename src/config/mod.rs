//! labflow settings.
//!
//! Settings are layered, lowest priority first:
//!
//! 1. built-in defaults
//! 2. the global file (`config.yml` in the platform config directory)
//! 3. the project file (`./labflow.yml`, or the path given with `--config`)
//! 4. `LABFLOW_*` environment variables
//!
//! Validation reports every problem at once rather than stopping at the first.

mod loader;


pub use loader::{ConfigLoader, ENV_OVERRIDES};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::data::LinkMode;
use crate::environment::EnvironmentManagerConfig;
use crate::error::{ErrorCode, LabflowError, Result};
use crate::source::GitSettings;

/// Valid log levels for configuration validation.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Name of the project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "labflow.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabflowConfig {
    pub log_level: String,
    pub environment: EnvironmentManagerConfig,
    pub git: GitSettings,
    /// Directory holding local workflow templates.
    pub templates_dir: Option<PathBuf>,
    pub staging: StagingSettings,
    pub run: RunSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagingSettings {
    pub link_mode: LinkMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Timeout for workflow commands in seconds; 0 waits indefinitely.
    pub timeout_secs: u64,
}

impl Default for LabflowConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            environment: EnvironmentManagerConfig::default(),
            git: GitSettings::default(),
            templates_dir: None,
            staging: StagingSettings::default(),
            run: RunSettings::default(),
        }
    }
}

impl LabflowConfig {
    pub fn run_timeout(&self) -> Option<Duration> {
        match self.run.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Check every field and report all problems together.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            problems.push(format!(
                "log_level '{}' must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }
        if self.environment.executable.trim().is_empty() {
            problems.push("environment.executable cannot be empty".to_string());
        }
        if self.environment.base_name.trim().is_empty() {
            problems.push("environment.base_name cannot be empty".to_string());
        }
        for root in &self.environment.roots {
            if !root.is_absolute() {
                problems.push(format!(
                    "environment.roots entry {} must be an absolute path",
                    root.display()
                ));
            }
        }
        if self.git.executable.trim().is_empty() {
            problems.push("git.executable cannot be empty".to_string());
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

/// `config.yml` in the platform configuration directory for labflow.
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "labflow", "labflow")
        .map(|dirs| dirs.config_dir().join("config.yml"))
}
