//! Rename reconciliation
//!
//! Turns one move event into `git rm --cached` + `git add` so that git sees
//! a rename instead of a delete and an untracked file. Every precondition
//! miss is a silent no-op; only a failing index command is an error.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::git::{path_exists, ProcessRunner, RepositoryProber};
use crate::path::normalize;
use crate::Result;

/// A single move inside the watched tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEvent {
    /// Root-relative path before the move
    pub old_path: String,
    /// Root-relative path after the move
    pub new_path: String,
    /// Whether the moved entry is a directory
    pub is_directory: bool,
}

impl RenameEvent {
    /// Create an event for a moved file
    pub fn file(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self {
            old_path: old_path.into(),
            new_path: new_path.into(),
            is_directory: false,
        }
    }

    /// Create an event for a moved directory
    pub fn directory(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self {
            old_path: old_path.into(),
            new_path: new_path.into(),
            is_directory: true,
        }
    }

    /// Old and new path are the same
    pub fn is_noop(&self) -> bool {
        self.old_path == self.new_path
    }
}

impl std::fmt::Display for RenameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = if self.is_directory { "/" } else { "" };
        write!(f, "{}{} -> {}{}", self.old_path, suffix, self.new_path, suffix)
    }
}

/// Supplies the root of the watched tree
///
/// Returns `None` when the tree is not backed by the local filesystem, in
/// which case nothing is reconciled.
pub trait RootSource: Send + Sync {
    /// Absolute path of the watched root on local disk
    fn local_root(&self) -> Option<PathBuf>;
}

/// A watched tree on local disk
#[derive(Debug, Clone)]
pub struct LocalRoot(pub PathBuf);

impl RootSource for LocalRoot {
    fn local_root(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Why an event was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Old and new path are identical
    Unchanged,
    /// The root is not on the local filesystem
    NotLocal,
    /// No metadata directory at the root
    NotRepository,
    /// The new path does not exist on disk
    Missing,
    /// The old path was not tracked
    Untracked,
}

/// Result of reconciling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A guard short-circuited; nothing was run
    Skipped(SkipReason),
    /// The index now records the move
    Staged {
        /// Normalized old path
        old_path: String,
        /// Normalized new path
        new_path: String,
    },
}

/// Build the `git rm --cached` arguments for `path`
pub fn untrack_args(path: &str, is_directory: bool) -> Vec<String> {
    let mut args = vec!["rm".to_string(), "--cached".to_string()];
    if is_directory {
        args.push("-r".to_string());
    }
    args.push("--".to_string());
    args.push(path.to_string());
    args
}

/// Build the `git add` arguments for `path`
pub fn track_args(path: &str) -> Vec<String> {
    vec!["add".to_string(), "--".to_string(), path.to_string()]
}

/// Fixes the index after a move
#[derive(Clone)]
pub struct Reconciler {
    root: Arc<dyn RootSource>,
    prober: RepositoryProber,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("root", &self.root.local_root())
            .field("prober", &self.prober)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler expecting `.git` at the root
    pub fn new(root: Arc<dyn RootSource>, runner: Arc<dyn ProcessRunner>) -> Self {
        let prober = RepositoryProber::new(runner.clone());
        Self {
            root,
            prober,
            runner,
        }
    }

    /// Use a different metadata directory name
    pub fn with_metadata_dir(mut self, metadata_dir: impl Into<String>) -> Self {
        self.prober = self.prober.with_metadata_dir(metadata_dir);
        self
    }

    /// Reconcile a [`RenameEvent`]
    pub async fn reconcile_event(&self, event: &RenameEvent) -> Result<ReconcileOutcome> {
        self.reconcile(&event.old_path, &event.new_path, event.is_directory)
            .await
    }

    /// Stage the move of `old_path` to `new_path` if it needs staging
    pub async fn reconcile(
        &self,
        old_path: &str,
        new_path: &str,
        is_directory: bool,
    ) -> Result<ReconcileOutcome> {
        if old_path == new_path {
            return Ok(ReconcileOutcome::Skipped(SkipReason::Unchanged));
        }

        let Some(root) = self.root.local_root() else {
            debug!(old_path, new_path, "Root is not on local disk, skipping");
            return Ok(ReconcileOutcome::Skipped(SkipReason::NotLocal));
        };

        let ctx = self.prober.context(&root);
        if !self.prober.has_repository(&ctx.root_path).await {
            debug!(root = %root.display(), "No repository at root, skipping");
            return Ok(ReconcileOutcome::Skipped(SkipReason::NotRepository));
        }

        let old_path = normalize(old_path);
        let new_path = normalize(new_path);
        if old_path == new_path {
            return Ok(ReconcileOutcome::Skipped(SkipReason::Unchanged));
        }

        if !path_exists(&ctx.root_path.join(&new_path)).await {
            debug!(new_path = %new_path, "New path not on disk, skipping");
            return Ok(ReconcileOutcome::Skipped(SkipReason::Missing));
        }

        if !self.prober.is_tracked(&ctx.root_path, &old_path).await {
            debug!(old_path = %old_path, "Old path not tracked, skipping");
            return Ok(ReconcileOutcome::Skipped(SkipReason::Untracked));
        }

        let rm = untrack_args(&old_path, is_directory);
        debug!(args = ?rm, "Untracking old path");
        self.runner.run(&ctx.root_path, &rm).await?;
        self.runner
            .run(&ctx.root_path, &track_args(&new_path))
            .await?;

        info!(old_path = %old_path, new_path = %new_path, is_directory, "Staged rename");
        Ok(ReconcileOutcome::Staged { old_path, new_path })
    }
}
