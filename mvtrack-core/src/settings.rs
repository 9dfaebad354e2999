//! Persisted user settings
//!
//! A small JSON blob kept next to the config file. Missing fields fall back
//! to their defaults so older files keep loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// User settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Free-form user value
    pub my_setting: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            my_setting: "default".to_string(),
        }
    }
}

/// Loads and saves [`Settings`] as JSON on disk
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Store settings at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store settings at `~/.config/mvtrack/settings.json`
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        Ok(Self::new(path))
    }

    /// Get the default settings file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mvtrack").join("settings.json"))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored settings, `None` if nothing was saved yet
    pub fn load(&self) -> Result<Option<Settings>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        let settings = serde_json::from_str(&contents)?;
        Ok(Some(settings))
    }

    /// Read the stored settings or the defaults
    pub fn load_or_default(&self) -> Result<Settings> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Write `settings`, creating parent directories as needed
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.load_or_default().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("nested").join("settings.json"));
        let settings = Settings {
            my_setting: "secret".to_string(),
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), Some(settings));
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"unrelated": true}"#).unwrap();

        let store = JsonSettingsStore::new(path);
        assert_eq!(store.load().unwrap(), Some(Settings::default()));
    }

    #[test]
    fn test_stored_field_name() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(json, r#"{"mySetting":"default"}"#);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonSettingsStore::new(path);
        assert!(matches!(store.load(), Err(Error::Json(_))));
    }
}
