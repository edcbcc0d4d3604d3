use crate::error::{ErrorCode, LabflowError};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command `{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Command `{command}` exited with status {code}")]
    ExitCode {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Command `{command}` terminated by signal {signal}")]
    Signal { command: String, signal: i32 },

    #[error("Command `{command}` was cancelled")]
    Cancelled { command: String },

    #[error("Failed to spawn `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while running `{command}`: {source}")]
    IoError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Output of `{command}` is not valid JSON: {source}")]
    InvalidJson {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

impl ProcessError {
    /// The rendered command line this error refers to, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            ProcessError::CommandNotFound(command) => Some(command),
            ProcessError::Timeout { command, .. }
            | ProcessError::ExitCode { command, .. }
            | ProcessError::Signal { command, .. }
            | ProcessError::Cancelled { command }
            | ProcessError::SpawnFailed { command, .. }
            | ProcessError::IoError { command, .. }
            | ProcessError::InvalidJson { command, .. } => Some(command),
            ProcessError::InternalError { .. } | ProcessError::MockExpectationNotMet(_) => None,
        }
    }
}

/// Convert ProcessError to LabflowError
impl From<ProcessError> for LabflowError {
    fn from(err: ProcessError) -> Self {
        let command = err.command().map(str::to_string);

        if let ProcessError::InvalidJson { .. } = err {
            return LabflowError::protocol(err.to_string(), command).with_source(err);
        }

        let (code, exit_code) = match &err {
            ProcessError::CommandNotFound(_) => (ErrorCode::EXEC_COMMAND_NOT_FOUND, None),
            ProcessError::Timeout { .. } => (ErrorCode::EXEC_TIMEOUT, None),
            ProcessError::ExitCode { code, .. } => (ErrorCode::EXEC_SUBPROCESS_FAILED, Some(*code)),
            ProcessError::Signal { signal, .. } => (ErrorCode::EXEC_SIGNAL_RECEIVED, Some(*signal)),
            ProcessError::Cancelled { .. } => (ErrorCode::EXEC_CANCELLED, None),
            ProcessError::SpawnFailed { .. } => (ErrorCode::EXEC_SPAWN_FAILED, None),
            ProcessError::IoError { .. } => (ErrorCode::EXEC_OUTPUT_ERROR, None),
            ProcessError::InvalidJson { .. }
            | ProcessError::InternalError { .. }
            | ProcessError::MockExpectationNotMet(_) => (ErrorCode::EXEC_GENERIC, None),
        };

        let mut error = LabflowError::execution_with_code(code, err.to_string(), command);
        if let LabflowError::Execution {
            exit_code: ex_code, ..
        } = &mut error
        {
            *ex_code = exit_code;
        }
        error.with_source(err)
    }
}
