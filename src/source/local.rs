use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{ensure_destination, WorkflowSource};
use crate::error::{ErrorCode, ErrorExt, LabflowError, Result};
use crate::subprocess::OutputLogger;

/// Copies a named template directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    templates_dir: PathBuf,
    template: String,
}

impl LocalSource {
    pub fn new(templates_dir: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            template: template.into(),
        }
    }

    /// The template directory. The name must be a single path segment, so
    /// the result always lies directly under the templates directory.
    pub fn template_path(&self) -> Result<PathBuf> {
        let mut components = Path::new(&self.template).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.templates_dir.join(name)),
            _ => Err(LabflowError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("Invalid template name '{}'", self.template),
            )),
        }
    }
}

#[async_trait]
impl WorkflowSource for LocalSource {
    async fn pull(&self, destination: &Path, logger: Option<Arc<dyn OutputLogger>>) -> Result<()> {
        let template = self.template_path()?;
        if !template.is_dir() {
            return Err(LabflowError::workflow_pull(
                ErrorCode::PULL_TEMPLATE_MISSING,
                format!("Template directory {} does not exist", template.display()),
                Some(destination.to_path_buf()),
            ));
        }

        info!("Copying template {} to {}", template.display(), destination.display());
        let copied = copy_tree(&template, destination).map_err(|e| {
            LabflowError::workflow_pull(
                ErrorCode::PULL_TOOL_FAILED,
                format!("Could not copy template '{}'", self.template),
                Some(destination.to_path_buf()),
            )
            .with_source(e)
        })?;

        if let Some(logger) = logger {
            logger.output(&format!("Copied {} files from {}", copied, template.display()));
        }

        ensure_destination(destination, &self.describe())
    }

    fn describe(&self) -> String {
        format!("template '{}'", self.template)
    }
}

/// Recursively copy `from` into `to`, returning the number of files copied.
fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    std::fs::create_dir_all(to).to_staging_error("Failed to create destination", to)?;

    let mut copied = 0;
    for entry in WalkDir::new(from).min_depth(1).follow_links(true) {
        let entry = entry.to_labflow("Failed to read template directory")?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .to_labflow("Template entry outside the template directory")?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .to_staging_error("Failed to create directory", &target)?;
        } else {
            std::fs::copy(entry.path(), &target).to_staging_error("Failed to copy file", &target)?;
            debug!("Copied {}", relative.display());
            copied += 1;
        }
    }
    Ok(copied)
}
