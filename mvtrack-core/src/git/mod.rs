//! Git operations for mvtrack
//!
//! This module provides the subprocess runner, the read-only repository
//! probes and a libgit2 view of staged changes.

mod prober;
mod repo;
mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use prober::{path_exists, RepositoryContext, RepositoryProber, TrackCheck};
pub use repo::{GitRepo, StagedChange};
pub use runner::{GitRunner, ProcessRunner};
