use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::WorkflowDescriptor;
use crate::data::{DatasetRepository, LinkMode, ParameterRepository, PulledDataset, Stager};
use crate::environment::{EnvironmentService, RunOptions};
use crate::error::{ErrorCode, LabflowError, Result};
use crate::generator::GeneratorContext;
use crate::metadata::MetadataContainer;
use crate::subprocess::OutputLogger;

/// A workflow directory ready to run.
#[derive(Debug, Clone)]
pub struct PreparedWorkflow {
    pub name: String,
    pub directory: PathBuf,
    pub datasets: Vec<PulledDataset>,
    pub context: GeneratorContext,
    /// Generated configuration files, in generator order.
    pub config_files: Vec<PathBuf>,
}

/// Outcome of running a prepared workflow.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub workflow: String,
    pub directory: PathBuf,
    /// `None` when the process timed out or was cancelled.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    /// Message of the failure, kept verbatim.
    pub error: Option<String>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Prepares workflow directories and runs them.
pub struct WorkflowRunner {
    repository: Arc<dyn DatasetRepository>,
    environments: Option<EnvironmentService>,
    link_mode: LinkMode,
    timeout: Option<Duration>,
}

impl WorkflowRunner {
    pub fn new(repository: Arc<dyn DatasetRepository>) -> Self {
        Self {
            repository,
            environments: None,
            link_mode: LinkMode::default(),
            timeout: None,
        }
    }

    pub fn with_environments(mut self, service: EnvironmentService) -> Self {
        self.environments = Some(service);
        self
    }

    pub fn with_link_mode(mut self, mode: LinkMode) -> Self {
        self.link_mode = mode;
        self
    }

    /// Bound for the workflow command; `None` or zero is unbounded.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Pull the source, stage data, write config files and apply the patch
    /// hook, in that order. Any failure aborts the preparation.
    pub async fn prepare(
        &self,
        workflow: &WorkflowDescriptor,
        directory: &Path,
        parameters: ParameterRepository,
        metadata: MetadataContainer,
        logger: Option<Arc<dyn OutputLogger>>,
    ) -> Result<PreparedWorkflow> {
        let context_for = |stage: &str| format!("Preparing '{}' ({})", workflow.name(), stage);
        // Staged paths are recorded under this root, so it must be absolute.
        let absolute = std::path::absolute(directory).map_err(|e| {
            LabflowError::staging_with_code(
                ErrorCode::STAGING_DIR_FAILED,
                format!("Cannot resolve workflow directory {}", directory.display()),
                Some(directory.to_path_buf()),
            )
            .with_source(e)
        })?;
        let directory = absolute.as_path();

        info!(
            "Pulling workflow '{}' from {} into {}",
            workflow.name(),
            workflow.source().describe(),
            directory.display()
        );
        workflow
            .source()
            .pull(directory, logger)
            .await
            .map_err(|e| e.with_context(context_for("source")))?;

        let stager = Stager::new(directory, self.link_mode);
        let mut context = GeneratorContext::new(parameters).with_metadata(metadata);
        let mut datasets = Vec::new();
        for (index, binding) in workflow.data().iter().enumerate() {
            let bound = binding
                .descriptor
                .bind(&context.parameters, binding.resolver.clone());
            let staged = bound
                .collect(self.repository.as_ref(), &stager)
                .await
                .map_err(|e| e.with_context(context_for(&format!("data {}", index))))?;
            debug!(
                "Data descriptor {} staged {} files",
                index,
                staged.files.len()
            );
            context.files.merge(&staged.files);
            context.samples.merge(&staged.samples);
            datasets.extend(staged.datasets);
        }

        let mut config_files = Vec::new();
        for generator in workflow.generators() {
            let path = generator
                .write(directory, &context)
                .map_err(|e| e.with_context(context_for("config")))?;
            config_files.push(path);
        }

        if let Some(patch) = workflow.patch() {
            patch(directory, &context).map_err(|e| e.with_context(context_for("patch")))?;
        }

        Ok(PreparedWorkflow {
            name: workflow.name().to_string(),
            directory: directory.to_path_buf(),
            datasets,
            context,
            config_files,
        })
    }

    /// Run the workflow command inside its environment, from the workflow
    /// directory.
    ///
    /// A command that fails to finish successfully yields a report carrying
    /// its exit code and message. Setup problems (no environment, no command)
    /// are errors.
    pub async fn execute(
        &self,
        workflow: &WorkflowDescriptor,
        prepared: &PreparedWorkflow,
        logger: Option<Arc<dyn OutputLogger>>,
    ) -> Result<RunReport> {
        let command = workflow.command().ok_or_else(|| {
            LabflowError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("Workflow '{}' has no run command", workflow.name()),
            )
        })?;
        let name = workflow.environment().ok_or_else(|| {
            LabflowError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("Workflow '{}' does not name an environment", workflow.name()),
            )
        })?;
        let service = self.environments.as_ref().ok_or_else(|| {
            LabflowError::config("No environment service configured for workflow runs")
        })?;
        let environment = service.environment(name).await?;

        let mut options = RunOptions::new()
            .cwd(&prepared.directory)
            .timeout(self.timeout);
        if let Some(logger) = logger {
            options = options.output(logger);
        }

        info!(
            "Running '{}' in environment '{}': {}",
            workflow.name(),
            name,
            command.command_line()
        );
        let started = Instant::now();
        let (exit_code, error) = match environment.run(command, options).await {
            Ok(output) => (output.status.code(), None),
            Err(e @ LabflowError::Execution { .. }) => {
                warn!("Workflow '{}' failed: {}", workflow.name(), e);
                (e.process_exit_code(), Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };

        Ok(RunReport {
            workflow: workflow.name().to_string(),
            directory: prepared.directory.clone(),
            exit_code,
            duration: started.elapsed(),
            error,
        })
    }

    /// Prepare then execute.
    pub async fn run(
        &self,
        workflow: &WorkflowDescriptor,
        directory: &Path,
        parameters: ParameterRepository,
        metadata: MetadataContainer,
        logger: Option<Arc<dyn OutputLogger>>,
    ) -> Result<RunReport> {
        let prepared = self
            .prepare(workflow, directory, parameters, metadata, logger.clone())
            .await?;
        self.execute(workflow, &prepared, logger).await
    }
}

impl std::fmt::Debug for WorkflowRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowRunner")
            .field("environments", &self.environments.is_some())
            .field("link_mode", &self.link_mode)
            .field("timeout", &self.timeout)
            .finish()
    }
}
