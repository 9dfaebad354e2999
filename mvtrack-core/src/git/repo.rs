//! Read-only view of the index through libgit2

use std::path::{Path, PathBuf};

use git2::{Repository, Status, StatusOptions};

use crate::{Error, Result};

/// A staged change as git reports it between HEAD and the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedChange {
    /// Path moved from `from` to `to`
    Renamed {
        /// Path in HEAD
        from: String,
        /// Path in the index
        to: String,
    },
    /// Path is new in the index
    Added(String),
    /// Path is gone from the index
    Deleted(String),
}

/// A git repository opened at the watched root
pub struct GitRepo {
    /// The underlying git2 repository
    repo: Repository,
    /// Path to the repository root
    root: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    /// Open the repository whose working tree is exactly `root`
    ///
    /// Parent directories are not searched.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();

        let repo = Repository::open(root).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::Config(format!(
                    "Not a git repository: {}. Run 'git init' first or point --root at a repository.",
                    root.display()
                ))
            } else {
                Error::Git(e)
            }
        })?;

        if repo.workdir().is_none() {
            return Err(Error::Config(
                "Bare repositories are not supported".to_string(),
            ));
        }

        Ok(Self {
            repo,
            root: root.to_path_buf(),
        })
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List staged changes with rename detection between HEAD and the index
    pub fn staged_changes(&self) -> Result<Vec<StagedChange>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .renames_head_to_index(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let mut changes = Vec::new();

        for entry in statuses.iter() {
            let status = entry.status();
            let Some(delta) = entry.head_to_index() else {
                continue;
            };
            let old = delta
                .old_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned());
            let new = delta
                .new_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned());

            if status.contains(Status::INDEX_RENAMED) {
                if let (Some(from), Some(to)) = (old, new) {
                    changes.push(StagedChange::Renamed { from, to });
                }
            } else if status.contains(Status::INDEX_NEW) {
                if let Some(path) = new {
                    changes.push(StagedChange::Added(path));
                }
            } else if status.contains(Status::INDEX_DELETED) {
                if let Some(path) = old {
                    changes.push(StagedChange::Deleted(path));
                }
            }
        }

        Ok(changes)
    }
}
