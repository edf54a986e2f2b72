//! Loads and persists the client configuration file.

use plotline_core::config::ClientConfig;
use plotline_core::error::{PlotlineError, Result};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;

use crate::paths::PlotlinePaths;

/// Reads `config.toml` into a [`ClientConfig`], tolerating absent and
/// partial files.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader for the default platform config file location.
    pub fn new() -> Result<Self> {
        let path =
            PlotlinePaths::config_file().map_err(|e| PlotlineError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a loader for an explicit path; used by tests.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the configuration.
    ///
    /// A missing or empty file yields the defaults; a partial file has
    /// its absent fields filled in from the defaults.
    pub fn load(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!("[ConfigLoader] No config file found, using defaults");
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Loads the configuration, writing the defaults to disk first when
    /// no file exists yet.
    pub fn load_or_init(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            let config = ClientConfig::default();
            self.save(&config)?;
            tracing::debug!(
                "[ConfigLoader] Wrote default config to {}",
                self.path.display()
            );
            return Ok(config);
        }
        self.load()
    }

    /// Saves the configuration atomically (tmp file + rename).
    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(config)?;

        let mut tmp_path = self.path.clone();
        tmp_path.set_extension("toml.tmp");
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("config.toml"));

        let config = loader.load().unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.pipeline.stream_timeout_secs, 300);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nbase_url = \"https://api.example.com\"\n").unwrap();

        let config = ConfigLoader::with_path(path).load().unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.persistence.retry_attempts, 3);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_path(dir.path().join("config.toml"));

        let mut config = ClientConfig::default();
        config.api.api_key = Some("secret".to_string());
        loader.save(&config).unwrap();

        let loaded = loader.load().unwrap();
        assert_eq!(loaded.api.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_or_init_creates_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let loader = ConfigLoader::with_path(path.clone());

        let config = loader.load_or_init().unwrap();
        assert!(path.exists());
        assert_eq!(config.auth.grant_duration_days, 4);
    }
}
