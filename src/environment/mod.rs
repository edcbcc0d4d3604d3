//! Named, isolated software environments (conda/mamba style).
//!
//! [`EnvironmentService`] creates, lists and removes environments through the
//! configured manager executable and hands out [`Environment`] handles that
//! run commands inside them. The list of environment names is read once and
//! then kept up to date by `create` and `remove`.

mod handle;
mod packages;
mod service;

#[cfg(test)]
mod tests;

pub use handle::{Environment, RunOptions};
pub use packages::{EnvironmentListing, InstalledPackage};
pub use service::EnvironmentService;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to reach the environment manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentManagerConfig {
    /// `mamba`, `conda` or a path to either.
    pub executable: String,
    /// Prefixes stripped from the environment paths the manager reports.
    pub roots: Vec<PathBuf>,
    /// Name of the root installation, never listed as an environment.
    pub base_name: String,
    /// Channels added before any caller-supplied channels on install.
    pub default_channels: Vec<String>,
}

impl Default for EnvironmentManagerConfig {
    fn default() -> Self {
        Self {
            executable: "mamba".to_string(),
            roots: Vec::new(),
            base_name: "base".to_string(),
            default_channels: Vec::new(),
        }
    }
}
