//! Repository and index probes
//!
//! Read-only checks used by the reconciler before it touches the index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{trace, warn};

use super::runner::ProcessRunner;

/// Absolute locations of the repository being reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    /// Root of the watched tree
    pub root_path: PathBuf,
    /// Metadata directory at the root (normally `<root>/.git`)
    pub metadata_dir_path: PathBuf,
}

impl RepositoryContext {
    /// Build the context for `root` with the given metadata directory name
    pub fn new(root: impl Into<PathBuf>, metadata_dir: &str) -> Self {
        let root_path = root.into();
        let metadata_dir_path = root_path.join(metadata_dir);
        Self {
            root_path,
            metadata_dir_path,
        }
    }
}

/// Answer of a tracked-path probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackCheck {
    /// The path is recorded in the index
    Tracked,
    /// git ran and reported no match
    Untracked,
    /// git could not be run to completion
    Unavailable(String),
}

impl TrackCheck {
    /// Whether the path is known to be tracked
    pub fn is_tracked(&self) -> bool {
        matches!(self, Self::Tracked)
    }
}

/// Probes a root directory for git metadata and tracked paths
#[derive(Clone)]
pub struct RepositoryProber {
    runner: Arc<dyn ProcessRunner>,
    metadata_dir: String,
}

impl std::fmt::Debug for RepositoryProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryProber")
            .field("metadata_dir", &self.metadata_dir)
            .finish_non_exhaustive()
    }
}

impl RepositoryProber {
    /// Create a prober that expects `.git` at the root
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            metadata_dir: ".git".to_string(),
        }
    }

    /// Use a different metadata directory name
    pub fn with_metadata_dir(mut self, metadata_dir: impl Into<String>) -> Self {
        self.metadata_dir = metadata_dir.into();
        self
    }

    /// Build the repository context for `root`
    pub fn context(&self, root: &Path) -> RepositoryContext {
        RepositoryContext::new(root, &self.metadata_dir)
    }

    /// Check whether `root` carries a metadata directory
    ///
    /// A `.git` file (worktrees, submodules) counts as well.
    pub async fn has_repository(&self, root: &Path) -> bool {
        path_exists(&self.context(root).metadata_dir_path).await
    }

    /// Check whether `relative_path` is tracked, keeping the reason for a negative answer
    pub async fn check_tracked(&self, root: &Path, relative_path: &str) -> TrackCheck {
        let args = vec![
            "ls-files".to_string(),
            "--error-unmatch".to_string(),
            "--".to_string(),
            relative_path.to_string(),
        ];

        match self.runner.run(root, &args).await {
            Ok(()) => TrackCheck::Tracked,
            Err(e) if e.exit_code.is_some() => {
                trace!(path = relative_path, error = %e, "Path not tracked");
                TrackCheck::Untracked
            }
            Err(e) => TrackCheck::Unavailable(e.to_string()),
        }
    }

    /// Check whether `relative_path` is tracked
    ///
    /// Never fails: a check that could not run counts as untracked.
    pub async fn is_tracked(&self, root: &Path, relative_path: &str) -> bool {
        match self.check_tracked(root, relative_path).await {
            TrackCheck::Tracked => true,
            TrackCheck::Untracked => false,
            TrackCheck::Unavailable(reason) => {
                warn!(path = relative_path, %reason, "Tracked-path check could not run");
                false
            }
        }
    }
}

/// Existence check that treats any IO failure as absence
pub async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
