use std::path::Path;
use std::sync::Arc;

use crate::command::Command;
use crate::data::{DataDescriptor, PathResolver};
use crate::error::{ErrorCode, LabflowError, Result};
use crate::generator::{ConfigGenerator, GeneratorContext};
use crate::source::WorkflowSource;

/// Runs after every config file is written, with the workflow directory.
pub type PatchHook = Arc<dyn Fn(&Path, &GeneratorContext) -> Result<()> + Send + Sync>;

/// A data descriptor and the resolver placing its files.
#[derive(Clone)]
pub struct DataBinding {
    pub descriptor: DataDescriptor,
    pub resolver: PathResolver,
}

/// Immutable template for one kind of analysis workflow.
#[derive(Clone)]
pub struct WorkflowDescriptor {
    name: String,
    source: Arc<dyn WorkflowSource>,
    data: Vec<DataBinding>,
    generators: Vec<Arc<dyn ConfigGenerator>>,
    patch: Option<PatchHook>,
    environment: Option<String>,
    command: Option<Command>,
}

impl WorkflowDescriptor {
    pub fn builder(
        name: impl Into<String>,
        source: Arc<dyn WorkflowSource>,
    ) -> WorkflowDescriptorBuilder {
        WorkflowDescriptorBuilder {
            descriptor: WorkflowDescriptor {
                name: name.into(),
                source,
                data: Vec::new(),
                generators: Vec::new(),
                patch: None,
                environment: None,
                command: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Arc<dyn WorkflowSource> {
        &self.source
    }

    pub fn data(&self) -> &[DataBinding] {
        &self.data
    }

    pub fn generators(&self) -> &[Arc<dyn ConfigGenerator>] {
        &self.generators
    }

    pub fn patch(&self) -> Option<&PatchHook> {
        self.patch.as_ref()
    }

    /// Environment the workflow command runs in.
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }
}

impl std::fmt::Debug for WorkflowDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowDescriptor")
            .field("name", &self.name)
            .field("source", &self.source.describe())
            .field("data", &self.data.len())
            .field(
                "generators",
                &self
                    .generators
                    .iter()
                    .map(|g| g.file_name().display().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("patch", &self.patch.is_some())
            .field("environment", &self.environment)
            .field("command", &self.command.as_ref().map(Command::command_line))
            .finish()
    }
}

pub struct WorkflowDescriptorBuilder {
    descriptor: WorkflowDescriptor,
}

impl WorkflowDescriptorBuilder {
    /// Data descriptors are staged in the order they are added.
    pub fn data(mut self, descriptor: DataDescriptor, resolver: PathResolver) -> Self {
        self.descriptor.data.push(DataBinding {
            descriptor,
            resolver,
        });
        self
    }

    /// Generators run in the order they are added.
    pub fn generator(mut self, generator: impl ConfigGenerator + 'static) -> Self {
        self.descriptor.generators.push(Arc::new(generator));
        self
    }

    pub fn shared_generator(mut self, generator: Arc<dyn ConfigGenerator>) -> Self {
        self.descriptor.generators.push(generator);
        self
    }

    pub fn patch<F>(mut self, patch: F) -> Self
    where
        F: Fn(&Path, &GeneratorContext) -> Result<()> + Send + Sync + 'static,
    {
        self.descriptor.patch = Some(Arc::new(patch));
        self
    }

    pub fn environment(mut self, name: impl Into<String>) -> Self {
        self.descriptor.environment = Some(name.into());
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.descriptor.command = Some(command);
        self
    }

    pub fn build(self) -> Result<WorkflowDescriptor> {
        let descriptor = self.descriptor;
        if descriptor.name.trim().is_empty() {
            return Err(LabflowError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "Workflow name must not be empty",
            ));
        }
        if let Some(command) = &descriptor.command {
            if command.base().is_empty() {
                return Err(LabflowError::command_with_code(
                    ErrorCode::COMMAND_EMPTY,
                    format!("Workflow '{}' has an empty run command", descriptor.name),
                ));
            }
        }
        Ok(descriptor)
    }
}
