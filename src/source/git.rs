use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{ensure_destination, WorkflowSource};
use crate::command::Command;
use crate::error::{ErrorCode, LabflowError, Result};
use crate::subprocess::{stream_to_completion, OutputLogger, ProcessRunner};

/// The revision to check out. A source names at most one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GitRef {
    #[default]
    Default,
    Branch(String),
    Tag(String),
}

impl GitRef {
    /// Combine the optional `branch` and `tag` of a manifest entry.
    pub fn from_parts(branch: Option<String>, tag: Option<String>) -> Result<Self> {
        match (branch, tag) {
            (Some(branch), Some(tag)) => Err(LabflowError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!(
                    "A git source takes a branch or a tag, not both (branch '{}', tag '{}')",
                    branch, tag
                ),
            )),
            (Some(branch), None) => Ok(GitRef::Branch(branch)),
            (None, Some(tag)) => Ok(GitRef::Tag(tag)),
            (None, None) => Ok(GitRef::Default),
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            GitRef::Default => None,
            GitRef::Branch(name) | GitRef::Tag(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    pub executable: String,
    /// History depth of the clone; 0 clones everything.
    pub depth: u32,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            executable: "git".to_string(),
            depth: 1,
        }
    }
}

/// Clones a remote repository.
pub struct GitSource {
    url: String,
    reference: GitRef,
    settings: GitSettings,
    runner: Arc<dyn ProcessRunner>,
}

impl GitSource {
    pub fn new(url: impl Into<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            url: url.into(),
            reference: GitRef::Default,
            settings: GitSettings::default(),
            runner,
        }
    }

    pub fn with_ref(mut self, reference: GitRef) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_settings(mut self, settings: GitSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn reference(&self) -> &GitRef {
        &self.reference
    }

    fn clone_command(&self, destination: &Path) -> Result<Command> {
        let depth = (self.settings.depth > 0).then(|| self.settings.depth.to_string());
        Ok(Command::new([self.settings.executable.as_str(), "clone"])
            .with_flag("--depth", depth)?
            .with_flag("--branch", self.reference.name())?
            .with_positional_argument(self.url.clone())
            .with_positional_argument(destination.to_path_buf()))
    }
}

#[async_trait]
impl WorkflowSource for GitSource {
    async fn pull(&self, destination: &Path, logger: Option<Arc<dyn OutputLogger>>) -> Result<()> {
        info!("Cloning {} into {}", self.describe(), destination.display());
        let process = self.clone_command(destination)?.to_process()?.build();

        let pull_error = |message: String, source: LabflowError| {
            LabflowError::workflow_pull(
                ErrorCode::PULL_TOOL_FAILED,
                message,
                Some(destination.to_path_buf()),
            )
            .with_source(source)
        };

        let output = async {
            let stream = self.runner.run_streaming(process.clone()).await?;
            stream_to_completion(stream, logger).await?.into_result(&process)
        }
        .await
        .map_err(|e| pull_error(format!("Could not clone {}", self.describe()), e.into()))?;

        tracing::debug!("Clone finished in {:?}", output.duration);
        ensure_destination(destination, &self.describe())
    }

    fn describe(&self) -> String {
        match &self.reference {
            GitRef::Default => self.url.clone(),
            GitRef::Branch(branch) => format!("{} (branch {})", self.url, branch),
            GitRef::Tag(tag) => format!("{} (tag {})", self.url, tag),
        }
    }
}
