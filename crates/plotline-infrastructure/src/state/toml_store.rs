//! Disk-backed key/value state with atomic TOML writes.
//!
//! Entries are written via tmp file + fsync + atomic rename under an
//! exclusive file lock, so a crash mid-write never corrupts the file.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use plotline_core::error::{PlotlineError, Result};
use plotline_core::state::StateStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::PlotlinePaths;

/// On-disk shape of the state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    entries: HashMap<String, StateEntry>,
}

/// One persisted entry.
///
/// The value is stored as its JSON encoding rather than as a TOML
/// value, because TOML has no representation for JSON null.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateEntry {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

impl StateEntry {
    fn encode(value: &serde_json::Value, expires_at: Option<DateTime<Utc>>) -> Result<Self> {
        Ok(Self {
            value: serde_json::to_string(value)?,
            expires_at: expires_at.map(|t| t.to_rfc3339()),
        })
    }

    fn decode(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.value)?)
    }

    /// True iff the entry has lapsed at `now`. An unparsable expiry
    /// counts as lapsed.
    fn expired_at(&self, now: DateTime<Utc>) -> bool {
        match &self.expires_at {
            None => false,
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(expires) => now >= expires.with_timezone(&Utc),
                Err(_) => true,
            },
        }
    }
}

/// Key/value state persisted to a single TOML file.
///
/// Expired entries are purged the first time they are read, so a `get`
/// after expiry behaves exactly like a `get` of an absent key.
pub struct TomlStateStore {
    path: PathBuf,
}

impl TomlStateStore {
    /// Creates a store at the default platform state file location.
    pub fn new() -> Result<Self> {
        let path = PlotlinePaths::state_file().map_err(|e| PlotlineError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a store at an explicit path; used by tests.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_file(path: &Path) -> Result<StateFile> {
        if !path.exists() {
            return Ok(StateFile::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(StateFile::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Writes the state file atomically: tmp file in the same
    /// directory, fsync, then rename over the destination.
    fn save_file(path: &Path, state: &StateFile) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(state)?;

        let tmp_path = temp_path(path)?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Read-modify-write under an exclusive file lock.
    fn mutate<F>(path: &Path, f: F) -> Result<()>
    where
        F: FnOnce(&mut StateFile),
    {
        let _lock = FileLock::acquire(path)?;
        let mut state = Self::load_file(path)?;
        f(&mut state);
        Self::save_file(path, &state)
    }
}

#[async_trait::async_trait]
impl StateStore for TomlStateStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let _lock = FileLock::acquire(&path)?;
            let mut state = Self::load_file(&path)?;

            let expired = match state.entries.get(&key) {
                Some(entry) => entry.expired_at(Utc::now()),
                None => return Ok(None),
            };
            if expired {
                state.entries.remove(&key);
                Self::save_file(&path, &state)?;
                return Ok(None);
            }

            state.entries.get(&key).map(StateEntry::decode).transpose()
        })
        .await
        .map_err(|e| PlotlineError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = StateEntry::encode(&value, None)?;
            Self::mutate(&path, |state| {
                state.entries.insert(key, entry);
            })
        })
        .await
        .map_err(|e| PlotlineError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn put_with_ttl(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<()> {
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| PlotlineError::internal(format!("TTL out of range: {}", e)))?;
        let expires_at = Utc::now() + ttl;

        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = StateEntry::encode(&value, Some(expires_at))?;
            Self::mutate(&path, |state| {
                state.entries.insert(key, entry);
            })
        })
        .await
        .map_err(|e| PlotlineError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            Self::mutate(&path, |state| {
                state.entries.remove(&key);
            })
        })
        .await
        .map_err(|e| PlotlineError::internal(format!("Failed to join task: {}", e)))?
    }
}

/// Gets a temporary file path for atomic writes.
fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        PlotlineError::io(format!("Path has no parent directory: {}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| PlotlineError::io(format!("Path has no file name: {}", path.display())))?;

    let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
    Ok(parent.join(tmp_name))
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquires an exclusive lock on the sibling `.lock` file.
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| PlotlineError::storage(format!("Failed to acquire lock: {}", e)))?;
        }

        #[cfg(not(unix))]
        {
            // No file locking off Unix; acceptable for a single-user client
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped
        let _ = fs::remove_file(&self.lock_path);
    }
}
