//! Destinations for the output of streamed processes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Receives process output line by line.
pub trait OutputLogger: Send + Sync {
    fn output(&self, text: &str);
    fn error(&self, text: &str);
}

/// Forwards process output to `tracing`.
pub struct TracingLogger {
    label: String,
}

impl TracingLogger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl OutputLogger for TracingLogger {
    fn output(&self, text: &str) {
        tracing::info!("[{}] {}", self.label, text);
    }

    fn error(&self, text: &str) {
        tracing::warn!("[{}] {}", self.label, text);
    }
}

/// Writes output to the terminal, stdout and stderr respectively.
pub struct ConsoleLogger;

impl OutputLogger for ConsoleLogger {
    fn output(&self, text: &str) {
        println!("{text}");
    }

    fn error(&self, text: &str) {
        eprintln!("{text}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Output(String),
    Error(String),
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferLogger {
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl BufferLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn output_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                LogLine::Output(text) => Some(text),
                LogLine::Error(_) => None,
            })
            .collect()
    }

    pub fn error_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                LogLine::Error(text) => Some(text),
                LogLine::Output(_) => None,
            })
            .collect()
    }

    fn push(&self, line: LogLine) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl OutputLogger for BufferLogger {
    fn output(&self, text: &str) {
        self.push(LogLine::Output(text.to_string()));
    }

    fn error(&self, text: &str) {
        self.push(LogLine::Error(text.to_string()));
    }
}

/// Appends output to a log file; error lines are prefixed with `[stderr]`.
pub struct FileLogger {
    file: Mutex<File>,
}

impl FileLogger {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_line(&self, line: &str) {
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!("Failed to write process log line: {}", e);
        }
    }
}

impl OutputLogger for FileLogger {
    fn output(&self, text: &str) {
        self.write_line(text);
    }

    fn error(&self, text: &str) {
        self.write_line(&format!("[stderr] {text}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_logger_separates_streams() {
        let logger = BufferLogger::new();
        logger.output("one");
        logger.error("two");
        logger.output("three");

        assert_eq!(logger.output_lines(), vec!["one", "three"]);
        assert_eq!(logger.error_lines(), vec!["two"]);
        assert_eq!(logger.lines().len(), 3);
    }

    #[test]
    fn test_file_logger_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        let logger = FileLogger::create(&path).unwrap();
        logger.output("started");
        logger.error("warning");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "started\n[stderr] warning\n");
    }
}
