//! Settings commands

use std::path::PathBuf;

use clap::{Args, Subcommand};
use mvtrack_core::JsonSettingsStore;

/// Settings management commands
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Settings file (defaults to ~/.config/mvtrack/settings.json)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the stored settings
    Show,

    /// Store a new value
    Set {
        /// New value for the setting
        value: String,
    },
}

impl SettingsArgs {
    /// Execute the settings command
    pub async fn execute(&self) -> anyhow::Result<()> {
        let store = match &self.file {
            Some(path) => JsonSettingsStore::new(path),
            None => JsonSettingsStore::open_default()?,
        };

        match &self.command {
            SettingsCommand::Show => {
                let stored = store.load()?;
                let settings = stored.clone().unwrap_or_default();
                println!("Settings file: {}", store.path().display());
                if stored.is_none() {
                    println!("  (not found - using defaults)");
                }
                println!("  my_setting: {}", settings.my_setting);
            }
            SettingsCommand::Set { value } => {
                let mut settings = store.load_or_default()?;
                settings.my_setting = value.clone();
                store.save(&settings)?;
                println!("Saved settings to {}", store.path().display());
            }
        }

        Ok(())
    }
}
