//! Configuration management for mvtrack
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (MVTRACK_*)
//! 3. Config file (~/.config/mvtrack/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Git-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitConfig {
    /// Path to the git executable
    pub binary: String,

    /// Name of the metadata directory expected at the watched root
    pub metadata_dir: String,

    /// Upper bound on a single git invocation (none by default)
    #[serde(with = "humantime_serde")]
    pub command_timeout: Option<Duration>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            metadata_dir: ".git".to_string(),
            command_timeout: None,
        }
    }
}

/// Watcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Root of the watched tree (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Poll interval used when the platform backend falls back to polling
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: None,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Git configuration
    pub git: GitConfig,

    /// Watcher configuration
    pub watch: WatchConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/mvtrack/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mvtrack").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - MVTRACK_GIT_PATH: Path to git executable
    /// - MVTRACK_ROOT: Root of the watched tree
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(git_path) = std::env::var("MVTRACK_GIT_PATH") {
            self.git.binary = git_path;
        }

        if let Ok(root) = std::env::var("MVTRACK_ROOT") {
            self.watch.root = Some(PathBuf::from(root));
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, git_path: Option<String>, root: Option<PathBuf>) -> Self {
        if let Some(path) = git_path {
            self.git.binary = path;
        }

        if let Some(root) = root {
            self.watch.root = Some(root);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(git_path: Option<String>, root: Option<PathBuf>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(git_path, root))
    }

    /// Resolve the watched root to an absolute path
    pub fn resolve_root(&self) -> Result<PathBuf> {
        let root = match &self.watch.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => std::env::current_dir()?.join(root),
            None => std::env::current_dir()?,
        };

        if !root.is_dir() {
            return Err(Error::Config(format!(
                "Watched root is not a directory: {}",
                root.display()
            )));
        }

        Ok(root)
    }
}
