use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::handle::Environment;
use super::packages::EnvironmentListing;
use super::EnvironmentManagerConfig;
use crate::command::Command;
use crate::error::{common, ErrorCode, LabflowError, Result};
use crate::subprocess::{ProcessCommand, ProcessError, ProcessOutput, ProcessRunner};

/// Creates, lists and removes named environments.
///
/// Cloning is cheap; clones share the runner and the name cache.
#[derive(Clone)]
pub struct EnvironmentService {
    inner: Arc<ServiceInner>,
}

pub(super) struct ServiceInner {
    pub(super) runner: Arc<dyn ProcessRunner>,
    pub(super) config: EnvironmentManagerConfig,
    names: Mutex<Option<Vec<String>>>,
    removed_flags: std::sync::Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl EnvironmentService {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: EnvironmentManagerConfig) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                runner,
                config,
                names: Mutex::new(None),
                removed_flags: std::sync::Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &EnvironmentManagerConfig {
        &self.inner.config
    }

    pub(super) fn runner(&self) -> &dyn ProcessRunner {
        self.inner.runner.as_ref()
    }

    /// The manager executable as the start of a command.
    pub fn base_command(&self) -> Command {
        Command::new([self.inner.config.executable.as_str()])
    }

    /// Names of all environments except the base installation.
    pub async fn environments(&self) -> Result<Vec<String>> {
        let mut names = self.inner.names.lock().await;
        if let Some(cached) = names.as_ref() {
            return Ok(cached.clone());
        }

        let fetched = self.fetch_environments().await?;
        *names = Some(fetched.clone());
        Ok(fetched)
    }

    /// Drop the cached names and read them again.
    pub async fn refresh(&self) -> Result<Vec<String>> {
        self.inner.names.lock().await.take();
        self.environments().await
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.environments().await?.iter().any(|n| n == name))
    }

    /// Create `name` unless it already exists.
    pub async fn create(&self, name: &str) -> Result<Environment> {
        validate_name(name)?;

        if self.exists(name).await? {
            debug!("Environment '{}' already exists", name);
            return Ok(self.handle(name));
        }

        info!("Creating environment '{}'", name);
        let command = self
            .base_command()
            .call(["create"])
            .with_flag("-y", true)?
            .with_flag("-n", name)?;
        self.run_checked(&command).await?;

        let mut names = self.inner.names.lock().await;
        if let Some(cached) = names.as_mut() {
            if !cached.iter().any(|n| n == name) {
                cached.push(name.to_string());
            }
        }
        drop(names);

        Ok(self.handle(name))
    }

    /// Handle for an existing environment.
    pub async fn environment(&self, name: &str) -> Result<Environment> {
        if self.exists(name).await? {
            Ok(self.handle(name))
        } else {
            Err(common::environment_not_found(name))
        }
    }

    fn handle(&self, name: &str) -> Environment {
        let mut flags = self
            .inner
            .removed_flags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let removed = flags
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone();
        Environment::new(name.to_string(), self.clone(), removed)
    }

    /// Forget `name`: evict it from the cache and invalidate its handles.
    pub(super) async fn evict(&self, name: &str) {
        if let Some(cached) = self.inner.names.lock().await.as_mut() {
            cached.retain(|n| n != name);
        }

        let mut flags = self
            .inner
            .removed_flags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(flag) = flags.remove(name) {
            flag.store(true, Ordering::SeqCst);
        }
    }

    async fn fetch_environments(&self) -> Result<Vec<String>> {
        debug!("Reading environment list");
        let command = self
            .base_command()
            .call(["env", "list"])
            .with_flag("--json", true)?;
        let listing: EnvironmentListing = self.run_json(&command).await?;
        let config = &self.inner.config;
        Ok(listing.names(&config.roots, &config.base_name))
    }

    /// Run to completion; a failed process is an error.
    pub(super) async fn run_checked(&self, command: &Command) -> Result<ProcessOutput> {
        let process = command.to_process()?.build();
        let output = self.runner().run(process.clone()).await?;
        Ok(output.into_result(&process)?)
    }

    pub(super) async fn run_json<T: DeserializeOwned>(&self, command: &Command) -> Result<T> {
        let process = command.to_process()?.build();
        let output = self.runner().run(process.clone()).await?;
        let output = output.into_result(&process)?;
        decode_json(&process, &output.stdout)
    }
}

/// Decode the single JSON document a protocol command prints.
pub(super) fn decode_json<T: DeserializeOwned>(process: &ProcessCommand, stdout: &str) -> Result<T> {
    serde_json::from_str(stdout).map_err(|source| {
        LabflowError::from(ProcessError::InvalidJson {
            command: process.command_line(),
            source,
        })
    })
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(LabflowError::command_with_code(
            ErrorCode::COMMAND_GENERIC,
            format!("Invalid environment name '{}'", name),
        ));
    }
    Ok(())
}

impl std::fmt::Debug for EnvironmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentService")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
