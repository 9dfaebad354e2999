//! Watch command - stage renames as they happen

use clap::Args;
use mvtrack_core::{Config, Error, RenameEvent, RenameQueue, RenameWatcher};

use super::build_reconciler;

/// Arguments for the watch command
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Report failures through the log only, without printing to stderr
    #[arg(long)]
    pub quiet: bool,
}

impl WatchArgs {
    /// Execute the watch command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let (root, reconciler) = build_reconciler(config)?;

        let quiet = self.quiet;
        let queue = RenameQueue::start(reconciler, move |event: &RenameEvent, error: &Error| {
            if !quiet {
                eprintln!("Failed to stage rename {}: {}", event, error);
            }
        });

        let watcher = RenameWatcher::new(&root, &config.watch, config.git.metadata_dir.clone())?;
        let cancel = queue.cancel_token();
        let watcher_task = watcher.spawn(queue.handle(), cancel.clone());

        println!("Watching {} for renames (Ctrl-C to stop)", root.display());
        if verbose {
            tracing::info!(
                root = %root.display(),
                git = %config.git.binary,
                "Watcher running"
            );
        }

        tokio::signal::ctrl_c().await?;
        println!();
        println!("Stopping...");

        cancel.cancel();
        if let Err(e) = watcher_task.await {
            tracing::warn!(error = %e, "Watcher task ended abnormally");
        }
        let stats = queue.shutdown().await;

        println!(
            "Staged {} rename(s), skipped {}, failed {}",
            stats.staged, stats.skipped, stats.failed
        );

        Ok(())
    }
}
