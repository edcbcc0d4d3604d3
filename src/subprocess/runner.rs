use async_trait::async_trait;
use futures::stream::Stream;
use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::oneshot;

use super::error::ProcessError;

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub stdin: Option<String>,
    pub suppress_stderr: bool,
}

impl ProcessCommand {
    /// Shell-quoted rendering used in logs and error messages
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(self.args.iter()))
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// Turn any unsuccessful exit status into the matching error.
    pub fn into_result(self, command: &ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let status = self.status.clone();
        match status {
            ExitStatus::Success => Ok(self),
            ExitStatus::Error(code) => Err(ProcessError::ExitCode {
                command: command.command_line(),
                code,
                stderr: self.stderr,
            }),
            ExitStatus::Timeout => Err(ProcessError::Timeout {
                command: command.command_line(),
                timeout: command.timeout.unwrap_or_default(),
            }),
            ExitStatus::Signal(signal) => Err(ProcessError::Signal {
                command: command.command_line(),
                signal,
            }),
            ExitStatus::Cancelled => Err(ProcessError::Cancelled {
                command: command.command_line(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Timeout,
    Signal(i32),
    Cancelled,
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            _ => None,
        }
    }
}

/// ExitStatusHelper for creating exit statuses
pub struct ExitStatusHelper;

impl ExitStatusHelper {
    /// Create a success exit status
    pub fn success() -> ExitStatus {
        ExitStatus::Success
    }

    /// Create a failure exit status with code
    pub fn failure(code: i32) -> ExitStatus {
        if code == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Error(code)
        }
    }
}

/// Requests termination of a streamed process.
#[derive(Debug, Default)]
pub struct KillSwitch(Option<oneshot::Sender<()>>);

impl KillSwitch {
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self(Some(tx)), rx)
    }

    /// A switch connected to nothing, for processes that cannot be killed.
    pub fn disarmed() -> Self {
        Self(None)
    }

    /// Returns false when the process had already finished or the switch was used.
    pub fn kill(&mut self) -> bool {
        self.0.take().map(|tx| tx.send(()).is_ok()).unwrap_or(false)
    }
}

pub type ProcessStreamItem = Result<String, ProcessError>;
pub type ProcessStreamFut = Pin<Box<dyn Stream<Item = ProcessStreamItem> + Send>>;
pub type ProcessStatusFut =
    Pin<Box<dyn futures::Future<Output = Result<ExitStatus, ProcessError>> + Send>>;

pub struct ProcessStream {
    pub pid: Option<u32>,
    pub stdout: ProcessStreamFut,
    pub stderr: ProcessStreamFut,
    pub status: ProcessStatusFut,
    pub kill: KillSwitch,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion, buffering stdout and stderr.
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;

    /// Start the process and hand back its output as line streams.
    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError>;
}

pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Normalize a line by removing trailing newlines
    fn normalize_line(mut line: String) -> String {
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }

    /// Create a line stream from a buffered reader
    fn create_line_stream<R>(reader: tokio::io::BufReader<R>, command: String) -> ProcessStreamFut
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        use tokio::io::AsyncBufReadExt;

        Box::pin(futures::stream::unfold(
            (reader, command),
            |(mut reader, command)| async move {
                let mut line = String::new();
                match reader.read_line(&mut line).await {
                    Ok(0) => None, // EOF
                    Ok(_) => {
                        let normalized = Self::normalize_line(line);
                        Some((Ok(normalized), (reader, command)))
                    }
                    Err(e) => Some((
                        Err(ProcessError::IoError {
                            command: command.clone(),
                            source: e,
                        }),
                        (reader, command),
                    )),
                }
            },
        )) as ProcessStreamFut
    }

    /// Wait for the child unless a kill is requested first.
    ///
    /// Returns `None` when the process was killed on request.
    async fn wait_or_kill(
        child: &mut tokio::process::Child,
        kill_rx: oneshot::Receiver<()>,
    ) -> std::io::Result<Option<std::process::ExitStatus>> {
        // A dropped switch must not kill the process.
        let killed = async {
            if kill_rx.await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            status = child.wait() => return status.map(Some),
            _ = killed => {}
        }

        Self::terminate(child, None)?;
        child.wait().await?;
        Ok(None)
    }

    /// Kill the child's whole process group, falling back to the child alone.
    ///
    /// `pid` is the id captured at spawn; the group outlives a reaped child.
    fn terminate(child: &mut tokio::process::Child, pid: Option<u32>) -> std::io::Result<()> {
        #[cfg(unix)]
        if let Some(pid) = pid.or_else(|| child.id()) {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if killpg(Pid::from_raw(pid as i32), Signal::SIGKILL).is_ok() {
                return Ok(());
            }
        }
        child.start_kill()
    }

    /// Create a status future with optional timeout and a kill switch
    fn create_status_future(
        mut child: tokio::process::Child,
        timeout: Option<Duration>,
        kill_rx: oneshot::Receiver<()>,
        command: String,
    ) -> ProcessStatusFut {
        let pid = child.id();
        Box::pin(async move {
            let waited = match timeout {
                Some(duration) => {
                    match tokio::time::timeout(duration, Self::wait_or_kill(&mut child, kill_rx))
                        .await
                    {
                        Ok(waited) => waited,
                        Err(_) => {
                            tracing::warn!("Subprocess timed out after {:?}: {}", duration, command);
                            let _ = Self::terminate(&mut child, pid);
                            let _ = child.wait().await;
                            return Ok(ExitStatus::Timeout);
                        }
                    }
                }
                None => Self::wait_or_kill(&mut child, kill_rx).await,
            };

            match waited {
                Ok(Some(status)) => Ok(Self::parse_exit_status(status)),
                Ok(None) => {
                    tracing::debug!("Subprocess killed on request: {}", command);
                    Ok(ExitStatus::Cancelled)
                }
                Err(e) => Err(ProcessError::IoError { command, source: e }),
            }
        })
    }

    /// Log command execution details
    fn log_command_start(command: &ProcessCommand) {
        tracing::debug!("Executing subprocess: {}", command.command_line());

        if !command.env.is_empty() {
            tracing::trace!("Extra environment variables: {:?}", command.env.keys());
        }

        if let Some(ref dir) = command.working_dir {
            tracing::trace!("Working directory: {:?}", dir);
        }

        if let Some(ref stdin) = command.stdin {
            tracing::trace!("Stdin provided: {} bytes", stdin.len());
        }
    }

    /// Configure the command with environment and working directory
    fn configure_command(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);

        // Own process group so signals aimed at us do not hit the child first
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        cmd.args(&command.args);
        cmd.envs(&command.env);
        cmd.kill_on_drop(true);

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        Self::configure_stdio(&mut cmd, command);
        cmd
    }

    /// Configure stdio pipes for the process
    fn configure_stdio(cmd: &mut tokio::process::Command, command: &ProcessCommand) {
        if command.stdin.is_some() {
            cmd.stdin(std::process::Stdio::piped());
        } else {
            cmd.stdin(std::process::Stdio::null());
        }

        cmd.stdout(std::process::Stdio::piped());

        if command.suppress_stderr {
            cmd.stderr(std::process::Stdio::null());
        } else {
            cmd.stderr(std::process::Stdio::piped());
        }
    }

    /// Write stdin data to the child process
    async fn write_stdin(
        child: &mut tokio::process::Child,
        command: &ProcessCommand,
        stdin_data: &str,
    ) -> Result<(), ProcessError> {
        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            let io_error = |source: std::io::Error| ProcessError::IoError {
                command: command.command_line(),
                source,
            };
            stdin
                .write_all(stdin_data.as_bytes())
                .await
                .map_err(io_error)?;
            stdin.shutdown().await.map_err(io_error)?;
        }
        Ok(())
    }

    /// Wait for process with optional timeout
    ///
    /// On timeout the whole process group is killed and `None` is returned.
    async fn wait_with_timeout(
        mut child: tokio::process::Child,
        command: &ProcessCommand,
    ) -> Result<Option<std::process::Output>, ProcessError> {
        let io_error = |source: std::io::Error| ProcessError::IoError {
            command: command.command_line(),
            source,
        };
        let Some(duration) = command.timeout else {
            return child.wait_with_output().await.map(Some).map_err(io_error);
        };

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collect = async {
            let (status, stdout, stderr) = tokio::try_join!(
                child.wait(),
                Self::read_pipe(stdout),
                Self::read_pipe(stderr)
            )?;
            Ok::<_, std::io::Error>(std::process::Output {
                status,
                stdout,
                stderr,
            })
        };
        let waited = tokio::time::timeout(duration, collect).await;

        match waited {
            Ok(result) => result.map(Some).map_err(io_error),
            Err(_) => {
                if let Err(e) = Self::terminate(&mut child, pid) {
                    tracing::debug!("Failed to kill timed out process: {}", e);
                }
                child.wait().await.map_err(io_error)?;
                Ok(None)
            }
        }
    }

    async fn read_pipe<R>(pipe: Option<R>) -> std::io::Result<Vec<u8>>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        use tokio::io::AsyncReadExt;

        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buffer).await?;
        }
        Ok(buffer)
    }

    /// Convert process exit status to our ExitStatus enum
    fn parse_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::parse_signal_status(status)
        }
    }

    /// Parse signal status on Unix systems
    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            ExitStatus::Signal(signal)
        } else {
            ExitStatus::Error(1)
        }
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> ExitStatus {
        ExitStatus::Error(1)
    }

    /// Build ProcessOutput from command output
    fn build_output(
        output: std::process::Output,
        command: &ProcessCommand,
        duration: Duration,
    ) -> ProcessOutput {
        ProcessOutput {
            status: Self::parse_exit_status(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: if command.suppress_stderr {
                String::new()
            } else {
                String::from_utf8_lossy(&output.stderr).to_string()
            },
            duration,
        }
    }

    /// Log the process execution result
    fn log_result(result: &ProcessOutput, command: &ProcessCommand) {
        let command_str = command.command_line();

        match &result.status {
            ExitStatus::Success => {
                tracing::debug!(
                    "Subprocess completed successfully in {:?}: {}",
                    result.duration,
                    command_str
                );
                tracing::trace!("Stdout length: {} bytes", result.stdout.len());
            }
            ExitStatus::Error(code) => {
                tracing::debug!(
                    "Subprocess failed with exit code {} in {:?}: {}",
                    code,
                    result.duration,
                    command_str
                );
                if !result.stderr.is_empty() {
                    tracing::trace!("Stderr: {}", result.stderr);
                }
            }
            ExitStatus::Signal(signal) => {
                tracing::warn!(
                    "Subprocess terminated by signal {} in {:?}: {}",
                    signal,
                    result.duration,
                    command_str
                );
            }
            ExitStatus::Timeout => {
                tracing::warn!(
                    "Subprocess timed out after {:?}: {}",
                    result.duration,
                    command_str
                );
            }
            ExitStatus::Cancelled => {
                tracing::debug!("Subprocess cancelled: {}", command_str);
            }
        }
    }

    /// Spawn and configure a process with optional stdin
    async fn spawn_configured_process(
        command: &ProcessCommand,
    ) -> Result<tokio::process::Child, ProcessError> {
        let mut cmd = Self::configure_command(command);

        let mut child = cmd.spawn().map_err(|e| {
            tracing::error!(
                "Failed to spawn '{}': {:?} (kind: {:?})",
                command.program,
                e,
                e.kind()
            );

            if e.kind() == std::io::ErrorKind::NotFound {
                ProcessError::CommandNotFound(command.program.clone())
            } else {
                ProcessError::SpawnFailed {
                    command: command.command_line(),
                    source: e,
                }
            }
        })?;

        if let Some(stdin_data) = &command.stdin {
            Self::write_stdin(&mut child, command, stdin_data).await?;
        }

        Ok(child)
    }

    /// Extract a stream from a child process, converting None to error
    fn extract_stream<T>(stream: Option<T>, stream_name: &str) -> Result<T, ProcessError> {
        stream.ok_or_else(|| ProcessError::InternalError {
            message: format!("Failed to capture {}", stream_name),
        })
    }

    /// Extract and create output streams from a child process
    fn create_output_streams(
        child: &mut tokio::process::Child,
        command: &ProcessCommand,
    ) -> Result<(ProcessStreamFut, ProcessStreamFut), ProcessError> {
        use tokio::io::BufReader;

        let stdout = Self::extract_stream(child.stdout.take(), "stdout")?;
        let stdout_stream =
            Self::create_line_stream(BufReader::new(stdout), command.command_line());

        let stderr_stream = if command.suppress_stderr {
            Box::pin(futures::stream::empty::<ProcessStreamItem>()) as ProcessStreamFut
        } else {
            let stderr = Self::extract_stream(child.stderr.take(), "stderr")?;
            Self::create_line_stream(BufReader::new(stderr), command.command_line())
        };

        Ok((stdout_stream, stderr_stream))
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let start = std::time::Instant::now();

        Self::log_command_start(&command);

        let child = Self::spawn_configured_process(&command).await?;

        let result = match Self::wait_with_timeout(child, &command).await? {
            Some(output) => Self::build_output(output, &command, start.elapsed()),
            None => ProcessOutput {
                status: ExitStatus::Timeout,
                stdout: String::new(),
                stderr: String::new(),
                duration: start.elapsed(),
            },
        };

        Self::log_result(&result, &command);

        Ok(result)
    }

    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        Self::log_command_start(&command);

        let mut child = Self::spawn_configured_process(&command).await?;

        let (stdout_stream, stderr_stream) = Self::create_output_streams(&mut child, &command)?;

        let pid = child.id();
        let (kill, kill_rx) = KillSwitch::new();
        let status_fut =
            Self::create_status_future(child, command.timeout, kill_rx, command.command_line());

        Ok(ProcessStream {
            pid,
            stdout: stdout_stream,
            stderr: stderr_stream,
            status: status_fut,
            kill,
        })
    }
}
