//! Application settings persistence.
//!
//! Settings live in the platform-specific config directory:
//! - Linux: ~/.config/runi/settings.json
//! - macOS: ~/Library/Application Support/runi/settings.json
//! - Windows: %APPDATA%/runi/settings.json

use std::path::PathBuf;

use runi_domain::{AppSettings, DomainError};
use tokio::fs;
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

const SETTINGS_FILE: &str = "settings.json";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// The stored settings are out of range.
    #[error("Invalid settings: {0}")]
    Invalid(#[from] DomainError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for [`AppSettings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsRepository {
    /// Overrides the platform config directory.
    dir: Option<PathBuf>,
}

impl SettingsRepository {
    /// Creates a repository in the platform config directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { dir: None }
    }

    /// Creates a repository that stores its file directly under `dir`.
    #[must_use]
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| dirs::config_dir().map(|p| p.join("runi")))
    }

    /// Returns the path of the settings file, if a config directory is available.
    #[must_use]
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.config_dir().map(|p| p.join(SETTINGS_FILE))
    }

    /// Loads settings from disk.
    ///
    /// Returns defaults if the file doesn't exist.
    pub async fn load(&self) -> Result<AppSettings, SettingsError> {
        let Some(path) = self.settings_path() else {
            return Ok(AppSettings::default());
        };

        if !fs::try_exists(&path).await? {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(AppSettings::default());
        }

        let content = fs::read(&path).await?;
        let settings: AppSettings = from_json_bytes(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Saves settings to disk, creating the config directory if needed.
    pub async fn save(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        let (Some(dir), Some(path)) = (self.config_dir(), self.settings_path()) else {
            return Err(SettingsError::NoConfigDir);
        };

        fs::create_dir_all(&dir).await?;
        fs::write(&path, to_json_stable_bytes(settings)?).await?;
        debug!(path = %path.display(), "settings saved");

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_path_is_under_runi() {
        if let Some(p) = SettingsRepository::new().settings_path() {
            assert!(p.ends_with("runi/settings.json"));
        }
    }

    #[tokio::test]
    async fn load_returns_defaults_when_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SettingsRepository::with_dir(dir.path());

        assert_eq!(repo.load().await.unwrap(), AppSettings::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SettingsRepository::with_dir(dir.path().join("nested"));
        let settings = AppSettings {
            history_page_size: 25,
            log_level: "debug".to_string(),
            ansi_logs: false,
        };

        repo.save(&settings).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn zero_page_size_on_disk_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), r#"{"history_page_size": 0}"#).unwrap();

        let result = SettingsRepository::with_dir(dir.path()).load().await;
        assert!(matches!(
            result,
            Err(SettingsError::Invalid(DomainError::InvalidPageSize(0)))
        ));
    }
}
