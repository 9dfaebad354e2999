//! mvtrack Core - keeps the git index in step with file renames
//!
//! git only notices a rename when both sides are staged together. This crate
//! watches a working tree for moves and, for each one, untracks the old path
//! and tracks the new one so that `git status` shows a rename instead of a
//! deletion plus an untracked file.

pub mod config;
pub mod error;
pub mod git;
pub mod path;
pub mod queue;
pub mod reconcile;
pub mod settings;
pub mod watch;

pub use config::Config;
pub use error::{CommandError, Error, Result};
pub use git::{GitRepo, GitRunner, ProcessRunner, RepositoryProber, StagedChange, TrackCheck};
pub use queue::{Notifier, QueueHandle, QueueStats, RenameQueue, RenameSink};
pub use reconcile::{LocalRoot, ReconcileOutcome, Reconciler, RenameEvent, RootSource, SkipReason};
pub use settings::{JsonSettingsStore, Settings};
pub use watch::RenameWatcher;
