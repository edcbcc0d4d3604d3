use super::{ErrorCode, LabflowError};
use std::path::{Path, PathBuf};

/// Extension trait for convenient error conversion
pub trait ErrorExt<T> {
    /// Convert to LabflowError with context
    fn to_labflow(self, context: impl Into<String>) -> Result<T, LabflowError>;

    /// Convert to LabflowError with specific error type
    fn to_config_error(self, message: impl Into<String>) -> Result<T, LabflowError>;
    fn to_staging_error(
        self,
        message: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<T, LabflowError>;
    fn to_execution_error(self, message: impl Into<String>) -> Result<T, LabflowError>;
}

impl<T, E> ErrorExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn to_labflow(self, context: impl Into<String>) -> Result<T, LabflowError> {
        self.map_err(|e| LabflowError::other(context).with_source(e))
    }

    fn to_config_error(self, message: impl Into<String>) -> Result<T, LabflowError> {
        self.map_err(|e| LabflowError::config(message).with_source(e))
    }

    fn to_staging_error(
        self,
        message: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<T, LabflowError> {
        self.map_err(|e| {
            LabflowError::staging_with_code(
                ErrorCode::STAGING_GENERIC,
                message,
                Some(path.as_ref().to_path_buf()),
            )
            .with_source(e)
        })
    }

    fn to_execution_error(self, message: impl Into<String>) -> Result<T, LabflowError> {
        self.map_err(|e| LabflowError::execution(message).with_source(e))
    }
}

/// Helper functions for common error scenarios
pub mod common {
    use super::*;

    /// Create a not found error for configuration
    pub fn config_not_found(path: impl AsRef<Path>) -> LabflowError {
        LabflowError::config_with_code(
            ErrorCode::CONFIG_NOT_FOUND,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
    }

    pub fn environment_not_found(name: &str) -> LabflowError {
        LabflowError::not_found(
            ErrorCode::NOT_FOUND_ENVIRONMENT,
            format!("Environment '{}' does not exist", name),
        )
    }

    /// Create a link failure error naming both ends of the link
    pub fn link_failed(source: &Path, destination: &Path) -> LabflowError {
        LabflowError::staging_with_code(
            ErrorCode::STAGING_LINK_FAILED,
            format!(
                "Failed to link {} to {}",
                source.display(),
                destination.display()
            ),
            Some(destination.to_path_buf()),
        )
    }

    pub fn directory_failed(path: PathBuf) -> LabflowError {
        LabflowError::staging_with_code(
            ErrorCode::STAGING_DIR_FAILED,
            format!("Failed to create directory {}", path.display()),
            Some(path),
        )
    }
}
