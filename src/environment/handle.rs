use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::packages::InstalledPackage;
use super::service::{decode_json, EnvironmentService};
use crate::command::{Command, Flag};
use crate::error::{common, Result};
use crate::subprocess::{
    stream_to_completion, OutputLogger, ProcessCommand, ProcessHandle, ProcessOutput,
    TracingLogger,
};

/// Options for running a command inside an environment.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Receives output line by line; setting it streams the run.
    pub output: Option<Arc<dyn OutputLogger>>,
    pub cwd: Option<PathBuf>,
    /// Ask the manager to pass output through as it is produced.
    pub live: bool,
    /// `None` or zero runs unbounded.
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, logger: Arc<dyn OutputLogger>) -> Self {
        self.output = Some(logger);
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    fn is_streamed(&self) -> bool {
        self.live || self.output.is_some()
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("output", &self.output.is_some())
            .field("cwd", &self.cwd)
            .field("live", &self.live)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Handle to one named environment.
///
/// Every operation fails with a not-found error once the environment has been
/// removed through any handle.
#[derive(Clone)]
pub struct Environment {
    name: String,
    service: EnvironmentService,
    removed: Arc<AtomicBool>,
}

impl Environment {
    pub(super) fn new(name: String, service: EnvironmentService, removed: Arc<AtomicBool>) -> Self {
        Self {
            name,
            service,
            removed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_removed() {
            return Err(common::environment_not_found(&self.name));
        }
        Ok(())
    }

    fn manager_command(&self, subcommand: &[&str]) -> Result<Command> {
        self.service
            .base_command()
            .call(subcommand.iter().copied())
            .with_flag("-n", self.name.as_str())
    }

    fn package_command(
        &self,
        subcommand: &str,
        packages: &[&str],
        channels: &[&str],
    ) -> Result<Command> {
        let mut all_channels: Vec<String> = self.service.config().default_channels.clone();
        all_channels.extend(channels.iter().map(|c| c.to_string()));

        Ok(self
            .manager_command(&[subcommand])?
            .with_flag("-y", true)?
            .add_flag(Flag::new("-c", all_channels)?.repeatable())
            .with_positional_arguments(packages.iter().map(|p| p.to_string())))
    }

    /// Install packages in the background.
    pub async fn install(&self, packages: &[&str], channels: &[&str]) -> Result<ProcessHandle> {
        self.ensure_active()?;
        info!("Installing {:?} into '{}'", packages, self.name);
        let command = self.package_command("install", packages, channels)?;
        self.spawn(&command).await
    }

    /// Uninstall packages in the background.
    pub async fn uninstall(&self, packages: &[&str], channels: &[&str]) -> Result<ProcessHandle> {
        self.ensure_active()?;
        info!("Removing {:?} from '{}'", packages, self.name);
        let command = self.package_command("remove", packages, channels)?;
        self.spawn(&command).await
    }

    /// `<manager> run -n <name> [--cwd <dir>] [--live-stream] <command...>`
    fn run_command(&self, command: &Command, options: &RunOptions) -> Result<ProcessCommand> {
        let mut wrapped = self.manager_command(&["run"])?;
        if let Some(cwd) = &options.cwd {
            wrapped = wrapped.with_flag("--cwd", cwd.to_string_lossy().into_owned())?;
        }
        wrapped = wrapped
            .with_flag("--live-stream", options.live)?
            .with_positional_argument(command.clone());

        Ok(wrapped.to_process()?.timeout(options.timeout).build())
    }

    /// Run a command inside the environment and wait for it.
    ///
    /// The run is streamed when `live` is set or an output logger is given.
    /// A non-zero exit is an execution error carrying the command line and
    /// exit status.
    pub async fn run(&self, command: &Command, options: RunOptions) -> Result<ProcessOutput> {
        self.ensure_active()?;
        let process = self.run_command(command, &options)?;

        if process.timeout.is_none() {
            warn!(
                "Running `{}` without a timeout; it may not terminate",
                process.command_line()
            );
        }

        let output = if options.is_streamed() {
            let stream = self.service.runner().run_streaming(process.clone()).await?;
            stream_to_completion(stream, options.output.clone()).await?
        } else {
            self.service.runner().run(process.clone()).await?
        };

        Ok(output.into_result(&process)?)
    }

    /// Start a command inside the environment without waiting for it.
    pub async fn start(&self, command: &Command, options: RunOptions) -> Result<ProcessHandle> {
        self.ensure_active()?;
        let process = self.run_command(command, &options)?;
        debug!("Starting `{}` in '{}'", command.command_line(), self.name);
        Ok(ProcessHandle::start(self.service.runner(), process, options.output).await?)
    }

    /// Run a command that prints one JSON document and decode it.
    pub async fn run_json<T: DeserializeOwned>(
        &self,
        command: &Command,
        options: RunOptions,
    ) -> Result<T> {
        let process = self.run_command(command, &options)?;
        let output = self.run(command, options).await?;
        decode_json(&process, &output.stdout)
    }

    /// Installed packages.
    pub async fn list(&self) -> Result<Vec<InstalledPackage>> {
        self.ensure_active()?;
        let command = self.manager_command(&["list"])?.with_flag("--json", true)?;
        self.service.run_json(&command).await
    }

    pub async fn packages(&self) -> Result<Vec<InstalledPackage>> {
        self.list().await
    }

    /// Delete the environment. Removing twice is a no-op.
    pub async fn remove(&self) -> Result<()> {
        if self.is_removed() {
            return Ok(());
        }

        info!("Removing environment '{}'", self.name);
        let command = self
            .manager_command(&["env", "remove"])?
            .with_flag("-y", true)?;
        self.service.run_checked(&command).await?;
        self.service.evict(&self.name).await;
        Ok(())
    }

    async fn spawn(&self, command: &Command) -> Result<ProcessHandle> {
        let logger: Arc<dyn OutputLogger> = Arc::new(TracingLogger::new(self.name.clone()));
        let process = command.to_process()?.build();
        Ok(ProcessHandle::start(self.service.runner(), process, Some(logger)).await?)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("name", &self.name)
            .field("removed", &self.is_removed())
            .finish()
    }
}
