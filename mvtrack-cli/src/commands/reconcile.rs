//! Reconcile command - stage a single rename by hand

use clap::Args;
use mvtrack_core::{Config, ReconcileOutcome, SkipReason};

use super::build_reconciler;

/// Arguments for the reconcile command
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Root-relative path before the move
    pub old_path: String,

    /// Root-relative path after the move
    pub new_path: String,

    /// The moved entry is a directory
    #[arg(short = 'r', long = "dir")]
    pub directory: bool,
}

impl ReconcileArgs {
    /// Execute the reconcile command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let (root, reconciler) = build_reconciler(config)?;

        if verbose {
            tracing::info!(
                root = %root.display(),
                old_path = %self.old_path,
                new_path = %self.new_path,
                directory = self.directory,
                "Reconciling rename"
            );
        }

        let outcome = reconciler
            .reconcile(&self.old_path, &self.new_path, self.directory)
            .await?;

        match outcome {
            ReconcileOutcome::Staged { old_path, new_path } => {
                println!("Staged rename: {} -> {}", old_path, new_path);
            }
            ReconcileOutcome::Skipped(reason) => {
                println!("Nothing to do: {}", describe(reason));
            }
        }

        Ok(())
    }
}

fn describe(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Unchanged => "old and new path are the same",
        SkipReason::NotLocal => "root is not on the local filesystem",
        SkipReason::NotRepository => "root is not a git repository",
        SkipReason::Missing => "new path does not exist",
        SkipReason::Untracked => "old path is not tracked",
    }
}
