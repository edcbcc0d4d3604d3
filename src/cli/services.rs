//! Long-lived collaborators shared by the command handlers.

use std::path::Path;

use crate::config::{ConfigLoader, LabflowConfig};
use crate::environment::EnvironmentService;
use crate::error::Result;
use crate::subprocess::SubprocessManager;

pub struct Services {
    pub config: LabflowConfig,
    pub processes: SubprocessManager,
    pub environments: EnvironmentService,
}

impl Services {
    pub fn new(config: LabflowConfig, processes: SubprocessManager) -> Self {
        let environments =
            EnvironmentService::new(processes.runner(), config.environment.clone());
        Self {
            config,
            processes,
            environments,
        }
    }

    /// Services backed by real processes.
    pub fn production(config: LabflowConfig) -> Self {
        Self::new(config, SubprocessManager::production())
    }
}

/// Load settings, honouring an explicit `--config` file.
pub fn load_config(path: Option<&Path>) -> Result<LabflowConfig> {
    let loader = ConfigLoader::new();
    match path {
        Some(path) => loader.with_project_file(path).load(),
        None => loader.load(),
    }
}
