use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::cli::args::{WorkflowArgs, WorkflowCommands};
use crate::cli::services::Services;
use crate::data::{DatasetRepository, InMemoryDatasetRepository, ParameterRepository};
use crate::error::{ErrorCode, LabflowError};
use crate::generator::GeneratorRegistry;
use crate::metadata::MetadataContainer;
use crate::subprocess::{ConsoleLogger, FileLogger, OutputLogger};
use crate::workflow::{ManifestBuildContext, PreparedWorkflow, WorkflowDescriptor, WorkflowManifest, WorkflowRunner};

/// A manifest turned into something runnable, plus its inputs.
struct LoadedWorkflow {
    descriptor: WorkflowDescriptor,
    runner: WorkflowRunner,
    parameters: ParameterRepository,
    metadata: MetadataContainer,
}

pub async fn run_workflow_command(command: WorkflowCommands, services: &Services) -> Result<()> {
    match command {
        WorkflowCommands::Prepare(args) => {
            let loaded = load_workflow(&args, services)?;
            let logger: Arc<dyn OutputLogger> = Arc::new(ConsoleLogger);
            let prepared = loaded
                .runner
                .prepare(
                    &loaded.descriptor,
                    &args.directory,
                    loaded.parameters,
                    loaded.metadata,
                    Some(logger),
                )
                .await?;
            print_summary(&prepared);
            Ok(())
        }
        WorkflowCommands::Run {
            workflow: args,
            log_file,
        } => {
            let loaded = load_workflow(&args, services)?;
            let logger: Arc<dyn OutputLogger> = match &log_file {
                Some(path) => Arc::new(FileLogger::create(path).map_err(|e| {
                    LabflowError::config(format!("Cannot open log file {}", path.display()))
                        .with_source(e)
                })?),
                None => Arc::new(ConsoleLogger),
            };

            let report = loaded
                .runner
                .run(
                    &loaded.descriptor,
                    &args.directory,
                    loaded.parameters,
                    loaded.metadata,
                    Some(logger),
                )
                .await?;

            info!(
                "Workflow '{}' finished in {:.1}s",
                report.workflow,
                report.duration.as_secs_f64()
            );
            match report.error {
                None => {
                    println!("Workflow '{}' completed in {}", report.workflow, report.directory.display());
                    Ok(())
                }
                Some(message) => Err(LabflowError::execution_with_code(
                    ErrorCode::EXEC_SUBPROCESS_FAILED,
                    format!("Workflow '{}' failed: {}", report.workflow, message),
                    None,
                )
                .into()),
            }
        }
    }
}

fn load_workflow(args: &WorkflowArgs, services: &Services) -> Result<LoadedWorkflow> {
    let config = &services.config;
    let manifest = WorkflowManifest::from_file(&args.manifest)?;
    let generators = GeneratorRegistry::with_builtins();
    let descriptor = manifest.build(&ManifestBuildContext {
        runner: services.processes.runner(),
        git: &config.git,
        templates_dir: config.templates_dir.as_deref(),
        generators: &generators,
    })?;

    let repository: Arc<dyn DatasetRepository> = match &args.catalog {
        Some(path) => Arc::new(InMemoryDatasetRepository::from_file(path)?),
        None => Arc::new(InMemoryDatasetRepository::default()),
    };
    let parameters = match &args.params {
        Some(path) => ParameterRepository::from_file(path)?,
        None => ParameterRepository::default(),
    };
    let metadata = match &args.metadata {
        Some(path) => MetadataContainer::from_csv(path)?,
        None => MetadataContainer::new(),
    };

    let runner = WorkflowRunner::new(repository)
        .with_environments(services.environments.clone())
        .with_link_mode(config.staging.link_mode)
        .with_timeout(config.run_timeout());

    Ok(LoadedWorkflow {
        descriptor,
        runner,
        parameters,
        metadata,
    })
}

fn print_summary(prepared: &PreparedWorkflow) {
    println!(
        "Prepared '{}' in {}",
        prepared.name,
        prepared.directory.display()
    );
    println!(
        "  {} files from {} datasets",
        prepared.context.files.len(),
        prepared.datasets.len()
    );
    for path in &prepared.config_files {
        println!("  wrote {}", relative_to(path, &prepared.directory).display());
    }
}

fn relative_to<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}
