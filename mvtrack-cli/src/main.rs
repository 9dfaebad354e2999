//! mvtrack CLI - Command line interface for mvtrack
//!
//! Keeps the git index in step with renames so git reports them as renames.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mvtrack_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ReconcileArgs, SettingsArgs, StatusArgs, WatchArgs};

/// mvtrack: stage file renames so git sees them as renames
#[derive(Parser, Debug)]
#[command(name = "mvtrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to git executable (overrides config and env)
    #[arg(long, global = true, env = "MVTRACK_GIT_PATH")]
    git_path: Option<String>,

    /// Root of the watched tree (overrides config and env)
    #[arg(long, global = true, env = "MVTRACK_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Watch the root and stage renames as they happen
    #[command(visible_alias = "w")]
    Watch(WatchArgs),

    /// Stage a single rename
    Reconcile(ReconcileArgs),

    /// Show staged changes, including detected renames
    #[command(visible_alias = "st")]
    Status(StatusArgs),

    /// Manage stored settings
    Settings(SettingsArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.git_path.clone(), cli.root.clone())?;

    if cli.verbose {
        tracing::info!(
            git = %config.git.binary,
            root = ?config.watch.root,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("mvtrack {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Watch(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Reconcile(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Status(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Settings(args)) => {
            args.execute().await?;
        }
        Some(Commands::Config) => {
            println!("mvtrack Configuration");
            println!("=====================");
            println!();
            println!("Git Settings:");
            println!("  binary: {}", config.git.binary);
            println!("  metadata_dir: {}", config.git.metadata_dir);
            match config.git.command_timeout {
                Some(timeout) => println!("  command_timeout: {}ms", timeout.as_millis()),
                None => println!("  command_timeout: (none)"),
            }
            println!();
            println!("Watch Settings:");
            match &config.watch.root {
                Some(root) => println!("  root: {}", root.display()),
                None => println!("  root: (current directory)"),
            }
            println!("  poll_interval: {}ms", config.watch.poll_interval.as_millis());
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("mvtrack - stage file renames so git sees them as renames");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
