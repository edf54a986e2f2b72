//! Unified path management for plotline configuration and state files.
//!
//! All plotline files live under the platform config directory so the
//! client behaves the same on Linux, macOS, and Windows.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for plotline.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/plotline/          # Config directory (XDG on Linux)
/// ├── config.toml              # Client configuration
/// └── state.toml               # Cached session, grant, and dataset keys
/// ```
pub struct PlotlinePaths;

impl PlotlinePaths {
    /// Returns the plotline configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/plotline/`)
    /// - `Err(PathError::ConfigDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("plotline"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the persisted key-value state file.
    ///
    /// The file holds the cached session id, the authorization grant,
    /// and dataset metadata between launches.
    pub fn state_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("state.toml"))
    }
}
