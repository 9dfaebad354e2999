//! Error types for mvtrack

use thiserror::Error;

/// Result type alias for mvtrack operations
pub type Result<T> = std::result::Result<T, Error>;

/// A git invocation that did not exit cleanly
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{program} {}` failed ({}){}", .args.join(" "), exit_label(.exit_code), stderr_suffix(.stderr))]
pub struct CommandError {
    /// Program that was executed
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Exit code, `None` when the process was killed, timed out or never started
    pub exit_code: Option<i32>,
    /// Captured standard error (or the spawn error message)
    pub stderr: String,
}

fn exit_label(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.trim() {
        "" => String::new(),
        trimmed => format!(": {}", trimmed),
    }
}

/// Error type for mvtrack operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A git command exited non-zero
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Filesystem watcher error
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Git index inspection error
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
