//! CLI command implementations

pub mod reconcile;
pub mod settings;
pub mod status;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use mvtrack_core::{Config, GitRunner, LocalRoot, Reconciler};

pub use reconcile::ReconcileArgs;
pub use settings::SettingsArgs;
pub use status::StatusArgs;
pub use watch::WatchArgs;

/// Resolve the watched root and build a reconciler for it
fn build_reconciler(config: &Config) -> anyhow::Result<(PathBuf, Reconciler)> {
    let root = config.resolve_root()?;
    let runner = GitRunner::from_config(&config.git);
    let reconciler = Reconciler::new(Arc::new(LocalRoot(root.clone())), Arc::new(runner))
        .with_metadata_dir(config.git.metadata_dir.clone());
    Ok((root, reconciler))
}
