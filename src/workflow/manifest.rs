use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use super::WorkflowDescriptor;
use crate::command::{Command, Flag, FlagValue};
use crate::data::{DataDescriptor, DataSource, DataTypeRef, PathResolver};
use crate::error::{ErrorCode, ErrorExt, LabflowError, Result};
use crate::generator::{GeneratorEntry, GeneratorRegistry};
use crate::source::{GitSettings, SourceSpec};
use crate::subprocess::ProcessRunner;

/// A workflow described entirely in YAML.
///
/// ```yaml
/// name: rnaseq
/// source: { type: git, url: "https://example.org/rnaseq.git", tag: v1.2 }
/// environment: snakemake
/// command:
///   base: [snakemake]
///   flags: { --cores: 8, --use-conda: true }
/// data:
///   - source: reads.datasets
///     select: [{ name: reads }]
///     resolvers: { fastq: "data/{sample}/reads.fastq" }
/// generators:
///   - { type: sample_sheet, file: config/samples.tsv }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowManifest {
    pub name: String,
    pub source: SourceSpec,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub command: Option<CommandSpec>,
    #[serde(default)]
    pub data: Vec<DataSpec>,
    #[serde(default)]
    pub generators: Vec<GeneratorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub base: Vec<String>,
    /// Flag name to value: `true`/`false`, a scalar, a list or null.
    #[serde(default)]
    pub flags: IndexMap<String, Value>,
    /// Flags rendered once per value.
    #[serde(default)]
    pub repeatable: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

/// One parameter path or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterPaths {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSpec {
    pub source: ParameterPaths,
    #[serde(default)]
    pub select: Vec<DataTypeRef>,
    /// File kind to destination template.
    pub resolvers: IndexMap<String, String>,
}

/// What a manifest needs to become a descriptor.
#[derive(Clone)]
pub struct ManifestBuildContext<'a> {
    pub runner: Arc<dyn ProcessRunner>,
    pub git: &'a GitSettings,
    pub templates_dir: Option<&'a Path>,
    pub generators: &'a GeneratorRegistry,
}

impl WorkflowManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .to_config_error(format!("Failed to read workflow manifest {}", path.display()))?;
        Self::parse(&content).map_err(|e| e.with_context(path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Every problem in the manifest, reported together.
    pub fn validate(&self, generators: &GeneratorRegistry) -> Result<()> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("name must not be empty".to_string());
        }
        if let SourceSpec::Git {
            branch: Some(_),
            tag: Some(_),
            ..
        } = &self.source
        {
            problems.push("source sets both branch and tag".to_string());
        }
        if self.command.is_some() && self.environment.is_none() {
            problems.push("command given without an environment".to_string());
        }
        if let Some(command) = &self.command {
            if command.base.is_empty() {
                problems.push("command.base must not be empty".to_string());
            }
            for name in &command.repeatable {
                if !command.flags.contains_key(name) {
                    problems.push(format!("command.repeatable names unknown flag '{}'", name));
                }
            }
        }
        for (index, data) in self.data.iter().enumerate() {
            if data.resolvers.is_empty() {
                problems.push(format!("data[{}] has no resolvers", index));
            }
        }
        for (index, entry) in self.generators.iter().enumerate() {
            if !generators.contains(&entry.kind) {
                problems.push(format!(
                    "generators[{}] uses unknown type '{}'",
                    index, entry.kind
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(LabflowError::config_with_code(
                ErrorCode::CONFIG_VALIDATION_FAILED,
                format!(
                    "Invalid workflow manifest '{}': {}",
                    self.name,
                    problems.join("; ")
                ),
            ))
        }
    }

    pub fn build(&self, context: &ManifestBuildContext<'_>) -> Result<WorkflowDescriptor> {
        self.validate(context.generators)?;

        let source = self
            .source
            .build(context.runner.clone(), context.git, context.templates_dir)?;
        let mut builder = WorkflowDescriptor::builder(self.name.clone(), source);

        for data in &self.data {
            let (descriptor, resolver) = data.to_binding()?;
            builder = builder.data(descriptor, resolver);
        }
        for entry in &self.generators {
            builder = builder.shared_generator(context.generators.build(entry)?);
        }
        if let Some(environment) = &self.environment {
            builder = builder.environment(environment.clone());
        }
        if let Some(command) = &self.command {
            builder = builder.command(command.to_command()?);
        }
        builder.build()
    }
}

impl CommandSpec {
    pub fn to_command(&self) -> Result<Command> {
        let mut command = Command::new(self.base.iter().cloned());
        for (name, value) in &self.flags {
            let mut flag = Flag::new(name.as_str(), flag_value(name, value)?)?;
            if self.repeatable.contains(name) {
                flag = flag.repeatable();
            }
            command = command.add_flag(flag);
        }
        Ok(command.with_positional_arguments(self.args.iter().cloned()))
    }
}

fn flag_value(name: &str, value: &Value) -> Result<FlagValue> {
    let scalar = |value: &Value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    match value {
        Value::Null => Ok(FlagValue::Absent),
        Value::Bool(b) => Ok(FlagValue::Bool(*b)),
        Value::Array(items) => items
            .iter()
            .map(|item| scalar(item).ok_or_else(|| invalid_flag(name, item)))
            .collect::<Result<Vec<_>>>()
            .map(FlagValue::List),
        other => scalar(other)
            .map(FlagValue::Str)
            .ok_or_else(|| invalid_flag(name, other)),
    }
}

fn invalid_flag(name: &str, value: &Value) -> LabflowError {
    LabflowError::config_with_code(
        ErrorCode::CONFIG_INVALID_VALUE,
        format!("Unsupported value {} for flag '{}'", value, name),
    )
}

impl DataSpec {
    pub fn to_binding(&self) -> Result<(DataDescriptor, PathResolver)> {
        let source = match &self.source {
            ParameterPaths::One(path) => DataSource::Path(path.clone()),
            ParameterPaths::Many(paths) => DataSource::Paths(paths.clone()),
        };
        let descriptor = DataDescriptor::new(source).select_all(self.select.iter().cloned());

        let resolver = self
            .resolvers
            .iter()
            .try_fold(PathResolver::new(), |resolver, (kind, template)| {
                resolver.with_template(kind.clone(), template)
            })?;
        Ok((descriptor, resolver))
    }
}

impl std::fmt::Debug for ManifestBuildContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestBuildContext")
            .field("git", self.git)
            .field("templates_dir", &self.templates_dir)
            .finish()
    }
}

