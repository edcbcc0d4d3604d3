//! Process execution for external tools.
//!
//! Everything that shells out goes through [`ProcessRunner`], so the
//! production runner can be swapped for [`MockProcessRunner`] in tests.

pub mod builder;
pub mod error;
pub mod handle;
pub mod logger;
pub mod mock;
pub mod runner;

#[cfg(test)]
mod tests;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use handle::{collect_output, stream_to_completion, ProcessHandle};
pub use logger::{BufferLogger, ConsoleLogger, FileLogger, LogLine, OutputLogger, TracingLogger};
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use runner::ProcessCommand;
pub use runner::{
    ExitStatus, ExitStatusHelper, KillSwitch, ProcessOutput, ProcessRunner, ProcessStream,
    TokioProcessRunner,
};

use std::sync::Arc;

#[derive(Clone)]
pub struct SubprocessManager {
    runner: Arc<dyn ProcessRunner>,
}

impl SubprocessManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    pub fn production() -> Self {
        Self::new(Arc::new(TokioProcessRunner))
    }

    pub fn mock() -> (Self, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
        (Self::new(runner), mock)
    }

    pub fn runner(&self) -> Arc<dyn ProcessRunner> {
        Arc::clone(&self.runner)
    }

    /// Start `command` in the background, forwarding its output to `logger`.
    pub async fn spawn(
        &self,
        command: ProcessCommand,
        logger: Option<Arc<dyn OutputLogger>>,
    ) -> Result<ProcessHandle, ProcessError> {
        ProcessHandle::start(self.runner.as_ref(), command, logger).await
    }
}

impl std::fmt::Debug for SubprocessManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubprocessManager").finish_non_exhaustive()
    }
}
