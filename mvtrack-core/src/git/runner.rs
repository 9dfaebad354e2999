//! Git subprocess execution

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::GitConfig;
use crate::error::CommandError;

/// Executes the version-control binary
///
/// Implementations resolve when the process exits with code 0 and fail with
/// a [`CommandError`] otherwise. No retries.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the binary with `args` inside `cwd`
    async fn run(&self, cwd: &Path, args: &[String]) -> Result<(), CommandError>;
}

/// Runs the real `git` binary through `tokio::process`
#[derive(Debug, Clone)]
pub struct GitRunner {
    /// Path to the git executable (defaults to "git" in PATH)
    binary: String,
    /// Optional upper bound on a single invocation
    timeout: Option<Duration>,
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl GitRunner {
    /// Create a runner for `git` found in PATH, with no timeout
    pub fn new() -> Self {
        Self {
            binary: "git".to_string(),
            timeout: None,
        }
    }

    /// Create a runner from the git section of the configuration
    pub fn from_config(config: &GitConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: config.command_timeout,
        }
    }

    /// Set a custom path to the git executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Get the configured executable
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn failure(&self, args: &[String], exit_code: Option<i32>, stderr: String) -> CommandError {
        CommandError {
            program: self.binary.clone(),
            args: args.to_vec(),
            exit_code,
            stderr,
        }
    }
}

#[async_trait]
impl ProcessRunner for GitRunner {
    async fn run(&self, cwd: &Path, args: &[String]) -> Result<(), CommandError> {
        debug!(binary = %self.binary, cwd = %cwd.display(), ?args, "Running git");

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, cmd.output()).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(self.failure(
                        args,
                        None,
                        format!("timed out after {}ms", limit.as_millis()),
                    ))
                }
            },
            None => cmd.output().await,
        };

        let output = output.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                self.failure(
                    args,
                    None,
                    format!("git executable not found at '{}'", self.binary),
                )
            } else {
                self.failure(args, None, e.to_string())
            }
        })?;

        trace!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            status = %output.status,
            "git finished"
        );

        if output.status.success() {
            Ok(())
        } else {
            Err(self.failure(
                args,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }
}
