//! Where workflow definitions come from.

mod git;
mod local;

#[cfg(test)]
mod tests;

pub use git::{GitRef, GitSettings, GitSource};
pub use local::LocalSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ErrorCode, LabflowError, Result};
use crate::subprocess::{OutputLogger, ProcessRunner};

/// Pulls a workflow definition into a working directory.
#[async_trait]
pub trait WorkflowSource: Send + Sync {
    /// Populate `destination`. On success the directory exists.
    async fn pull(&self, destination: &Path, logger: Option<Arc<dyn OutputLogger>>) -> Result<()>;

    /// Short human readable origin, for logs.
    fn describe(&self) -> String;
}

/// Serialisable description of a source, as written in manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    Git {
        url: String,
        #[serde(default)]
        branch: Option<String>,
        #[serde(default)]
        tag: Option<String>,
    },
    Local {
        template: String,
        #[serde(default)]
        templates_dir: Option<PathBuf>,
    },
}

impl SourceSpec {
    pub fn build(
        &self,
        runner: Arc<dyn ProcessRunner>,
        git: &GitSettings,
        templates_dir: Option<&Path>,
    ) -> Result<Arc<dyn WorkflowSource>> {
        match self {
            SourceSpec::Git { url, branch, tag } => {
                let reference = GitRef::from_parts(branch.clone(), tag.clone())?;
                Ok(Arc::new(
                    GitSource::new(url.clone(), runner)
                        .with_ref(reference)
                        .with_settings(git.clone()),
                ))
            }
            SourceSpec::Local {
                template,
                templates_dir: own_dir,
            } => {
                let dir = own_dir
                    .as_deref()
                    .or(templates_dir)
                    .ok_or_else(|| {
                        LabflowError::config_with_code(
                            ErrorCode::CONFIG_INVALID_VALUE,
                            format!("No templates directory configured for template '{}'", template),
                        )
                    })?;
                let source = LocalSource::new(dir, template.clone());
                source.template_path()?;
                Ok(Arc::new(source))
            }
        }
    }
}

/// A successful pull that left nothing behind is still a failed pull.
pub(crate) fn ensure_destination(destination: &Path, origin: &str) -> Result<()> {
    if destination.is_dir() {
        return Ok(());
    }
    Err(LabflowError::workflow_pull(
        ErrorCode::PULL_DESTINATION_MISSING,
        format!(
            "{} did not produce {}",
            origin,
            destination.display()
        ),
        Some(destination.to_path_buf()),
    ))
}
