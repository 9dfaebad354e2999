//! Scripted process runner for unit tests

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::runner::ProcessRunner;
use crate::error::CommandError;

/// Records every invocation and answers from a small script
///
/// `ls-files` succeeds only for paths registered with [`with_tracked`](Self::with_tracked);
/// any command whose arguments contain a string registered with
/// [`fail_when`](Self::fail_when) exits with code 1.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    tracked: HashSet<String>,
    failing: Vec<String>,
    unavailable: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracked<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tracked.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn fail_when(mut self, needle: impl Into<String>) -> Self {
        self.failing.push(needle.into());
        self
    }

    /// Behave as if the binary could not be spawned
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn cwds(&self) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(cwd, _)| cwd.clone())
            .collect()
    }

    /// Calls other than the tracked-path probe
    pub fn mutations(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| args.first().map(String::as_str) != Some("ls-files"))
            .collect()
    }

    /// Highest number of invocations observed running at once
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn error(&self, args: &[String], exit_code: Option<i32>, stderr: &str) -> CommandError {
        CommandError {
            program: "git".to_string(),
            args: args.to_vec(),
            exit_code,
            stderr: stderr.to_string(),
        }
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, cwd: &Path, args: &[String]) -> Result<(), CommandError> {
        self.calls
            .lock()
            .unwrap()
            .push((cwd.to_path_buf(), args.to_vec()));

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.unavailable {
            Err(self.error(args, None, "git executable not found"))
        } else if self.failing.iter().any(|needle| args.contains(needle)) {
            Err(self.error(args, Some(1), "fatal: scripted failure"))
        } else if args.first().map(String::as_str) == Some("ls-files") {
            match args.last() {
                Some(path) if self.tracked.contains(path) => Ok(()),
                _ => Err(self.error(args, Some(1), "error: pathspec did not match")),
            }
        } else {
            Ok(())
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
