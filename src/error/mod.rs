use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

pub mod codes;
pub mod helpers;


pub use codes::{describe_error_code, ErrorCode};
pub use helpers::{common, ErrorExt};

pub type Result<T, E = LabflowError> = std::result::Result<T, E>;

/// The unified error type for labflow
#[derive(Error, Debug)]
pub enum LabflowError {
    #[error("[E{code:04}] Command error: {message}")]
    Command {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Staging error: {message}")]
    Staging {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Execution error: {message}")]
    Execution {
        code: u16,
        message: String,
        command: Option<String>,
        exit_code: Option<i32>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Protocol error: {message}")]
    Protocol {
        code: u16,
        message: String,
        command: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Workflow pull failed: {message}")]
    WorkflowPull {
        code: u16,
        message: String,
        destination: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Not found: {message}")]
    NotFound {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LabflowError {
    /// Create a command construction error with default code
    pub fn command(message: impl Into<String>) -> Self {
        Self::command_with_code(ErrorCode::COMMAND_GENERIC, message)
    }

    pub fn command_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Command {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a staging error with default code
    pub fn staging(message: impl Into<String>) -> Self {
        Self::staging_with_code(ErrorCode::STAGING_GENERIC, message, None)
    }

    /// Create a staging error with specific code and path
    pub fn staging_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Staging {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create an execution error with default code
    pub fn execution(message: impl Into<String>) -> Self {
        Self::execution_with_code(ErrorCode::EXEC_GENERIC, message, None)
    }

    /// Create an execution error with specific code
    pub fn execution_with_code(
        code: u16,
        message: impl Into<String>,
        command: Option<String>,
    ) -> Self {
        Self::Execution {
            code,
            message: message.into(),
            command,
            exit_code: None,
            source: None,
        }
    }

    /// Create a protocol error for output that could not be decoded
    pub fn protocol(message: impl Into<String>, command: Option<String>) -> Self {
        Self::Protocol {
            code: ErrorCode::PROTOCOL_INVALID_JSON,
            message: message.into(),
            command,
            source: None,
        }
    }

    /// Create a workflow pull error with specific code and destination
    pub fn workflow_pull(
        code: u16,
        message: impl Into<String>,
        destination: Option<PathBuf>,
    ) -> Self {
        Self::WorkflowPull {
            code,
            message: message.into(),
            destination,
            source: None,
        }
    }

    pub fn not_found(code: u16, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a generic other error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Command { source: src, .. }
            | Self::Config { source: src, .. }
            | Self::Staging { source: src, .. }
            | Self::Execution { source: src, .. }
            | Self::Protocol { source: src, .. }
            | Self::WorkflowPull { source: src, .. }
            | Self::NotFound { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Command { message, .. }
            | Self::Config { message, .. }
            | Self::Staging { message, .. }
            | Self::Execution { message, .. }
            | Self::Protocol { message, .. }
            | Self::WorkflowPull { message, .. }
            | Self::NotFound { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", context, message);
            }
        }
        self
    }

    /// Get the process exit code the CLI should report for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Command { .. } => 2,
            Self::Config { .. } => 3,
            Self::Staging { .. } => 4,
            Self::Execution { .. } => 5,
            Self::Protocol { .. } => 6,
            Self::WorkflowPull { .. } => 7,
            Self::NotFound { .. } => 8,
            Self::Other { .. } => 1,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Command { code, .. }
            | Self::Config { code, .. }
            | Self::Staging { code, .. }
            | Self::Execution { code, .. }
            | Self::Protocol { code, .. }
            | Self::WorkflowPull { code, .. }
            | Self::NotFound { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    /// The exit status of the failed process, when this is an execution error
    pub fn process_exit_code(&self) -> Option<i32> {
        match self {
            Self::Execution { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Command { message, .. } => format!("Invalid command: {}", message),
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Staging { message, path, .. } => match path {
                Some(p) => format!("Staging failed at {}: {}", p.display(), message),
                None => format!("Staging failed: {}", message),
            },
            Self::Execution {
                message,
                exit_code,
                ..
            } => match exit_code {
                Some(code) => format!("{} (exit code {})", message, code),
                None => message.clone(),
            },
            Self::Protocol { message, .. } => format!("Unexpected process output: {}", message),
            Self::WorkflowPull { message, .. } => format!("Could not fetch workflow: {}", message),
            Self::NotFound { message, .. } => message.clone(),
            Self::Other { message, .. } => message.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<std::io::Error> for LabflowError {
    fn from(err: std::io::Error) -> Self {
        LabflowError::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for LabflowError {
    fn from(err: serde_json::Error) -> Self {
        LabflowError::config_with_code(ErrorCode::CONFIG_INVALID_JSON, err.to_string())
            .with_source(err)
    }
}

impl From<serde_yaml::Error> for LabflowError {
    fn from(err: serde_yaml::Error) -> Self {
        LabflowError::config_with_code(ErrorCode::CONFIG_INVALID_YAML, err.to_string())
            .with_source(err)
    }
}
