//! Status command - show what the index currently records

use clap::Args;
use mvtrack_core::{Config, GitRepo, StagedChange};

/// Show staged renames, additions and deletions
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only list renames
    #[arg(long)]
    pub renames_only: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let root = config.resolve_root()?;
        let repo = GitRepo::open(&root)?;
        let changes = repo.staged_changes()?;

        let shown: Vec<_> = changes
            .iter()
            .filter(|c| !self.renames_only || matches!(c, StagedChange::Renamed { .. }))
            .collect();

        println!();
        if shown.is_empty() {
            println!("No staged changes in {}.", root.display());
            return Ok(());
        }

        println!("Staged changes in {}:", root.display());
        println!();
        for change in shown {
            match change {
                StagedChange::Renamed { from, to } => println!("  renamed:  {} -> {}", from, to),
                StagedChange::Added(path) => println!("  added:    {}", path),
                StagedChange::Deleted(path) => println!("  deleted:  {}", path),
            }
        }

        Ok(())
    }
}
