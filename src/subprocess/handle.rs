use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

use super::error::ProcessError;
use super::logger::OutputLogger;
use super::runner::{
    KillSwitch, ProcessCommand, ProcessOutput, ProcessRunner, ProcessStatusFut, ProcessStream,
    ProcessStreamFut,
};

/// Pump both output streams (forwarding each line to `logger`) while waiting
/// for the exit status.
pub async fn collect_output(
    stdout: ProcessStreamFut,
    stderr: ProcessStreamFut,
    status: ProcessStatusFut,
    logger: Option<Arc<dyn OutputLogger>>,
) -> Result<ProcessOutput, ProcessError> {
    let start = Instant::now();

    let stdout_logger = logger.clone();
    let stdout_task = async move {
        let mut stdout = stdout;
        let mut buffer = String::new();
        while let Some(line) = stdout.next().await {
            let line = line?;
            if let Some(logger) = &stdout_logger {
                logger.output(&line);
            }
            buffer.push_str(&line);
            buffer.push('\n');
        }
        Ok::<_, ProcessError>(buffer)
    };

    let stderr_task = async move {
        let mut stderr = stderr;
        let mut buffer = String::new();
        while let Some(line) = stderr.next().await {
            let line = line?;
            if let Some(logger) = &logger {
                logger.error(&line);
            }
            buffer.push_str(&line);
            buffer.push('\n');
        }
        Ok::<_, ProcessError>(buffer)
    };

    let (stdout, stderr, status) = futures::join!(stdout_task, stderr_task, status);

    Ok(ProcessOutput {
        status: status?,
        stdout: stdout?,
        stderr: stderr?,
        duration: start.elapsed(),
    })
}

/// Run a streamed process to completion.
pub async fn stream_to_completion(
    stream: ProcessStream,
    logger: Option<Arc<dyn OutputLogger>>,
) -> Result<ProcessOutput, ProcessError> {
    let ProcessStream {
        stdout,
        stderr,
        status,
        kill: _kill,
        ..
    } = stream;
    collect_output(stdout, stderr, status, logger).await
}

/// A process running in the background.
///
/// Output is forwarded to the logger given at start; the logger is released
/// as soon as the process finishes or is cancelled.
pub struct ProcessHandle {
    command: ProcessCommand,
    pid: Option<u32>,
    kill: KillSwitch,
    task: JoinHandle<Result<ProcessOutput, ProcessError>>,
}

impl ProcessHandle {
    pub async fn start(
        runner: &dyn ProcessRunner,
        command: ProcessCommand,
        logger: Option<Arc<dyn OutputLogger>>,
    ) -> Result<Self, ProcessError> {
        let ProcessStream {
            pid,
            stdout,
            stderr,
            status,
            kill,
        } = runner.run_streaming(command.clone()).await?;

        let task = tokio::spawn(collect_output(stdout, stderr, status, logger));
        tracing::debug!("Started background process: {}", command.command_line());

        Ok(Self {
            command,
            pid,
            kill,
            task,
        })
    }

    pub fn command(&self) -> &ProcessCommand {
        &self.command
    }

    pub fn command_line(&self) -> String {
        self.command.command_line()
    }

    /// OS process id, when the runner spawned a real process
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the process; a non-zero exit is an error.
    pub async fn wait(self) -> Result<ProcessOutput, ProcessError> {
        let Self { command, task, .. } = self;
        Self::join(task).await?.into_result(&command)
    }

    /// Kill the process and return whatever output it produced.
    pub async fn cancel(self) -> Result<ProcessOutput, ProcessError> {
        let Self {
            command,
            mut kill,
            task,
            ..
        } = self;
        if kill.kill() {
            tracing::debug!("Cancelling process: {}", command.command_line());
        }
        Self::join(task).await
    }

    async fn join(
        task: JoinHandle<Result<ProcessOutput, ProcessError>>,
    ) -> Result<ProcessOutput, ProcessError> {
        task.await.map_err(|e| ProcessError::InternalError {
            message: format!("Process task failed: {}", e),
        })?
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("command", &self.command.command_line())
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
