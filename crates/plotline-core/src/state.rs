//! Key/value state port with TTL semantics.
//!
//! The client's persisted local state (cached session identifiers, the
//! authorization grant, dataset metadata) goes through this injected
//! interface, so the disk-backed store can be swapped for an in-memory
//! one in tests.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Well-known keys for the client's persisted state.
pub mod keys {
    /// Cached conversation session id.
    pub const SESSION_ID: &str = "session.id";
    /// Owner of the cached conversation session.
    pub const SESSION_OWNER: &str = "session.owner";
    /// Current authorization grant record.
    pub const AUTH_GRANT: &str = "auth.grant";
    /// Dataset id from the most recent completed pipeline run.
    pub const DATASET_ID: &str = "dataset.id";
    /// Dataset display name from the most recent completed pipeline run.
    pub const DATASET_NAME: &str = "dataset.name";
    /// Grant key names used by earlier releases. Cleared together with
    /// `AUTH_GRANT` so a stale record cannot resurrect access.
    pub const LEGACY_GRANT_KEYS: &[&str] = &["verified_subject", "verification_expires_at"];
}

/// An abstract key/value store for persisted client state.
///
/// Values are JSON so heterogeneous records (plain strings, structured
/// grants) share one interface. Writes are last-write-wins; there is no
/// cross-process consistency guarantee.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads a value. An expired entry is treated as absent.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Writes a value without expiry.
    async fn put(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Writes a value that expires `ttl` from now.
    async fn put_with_ttl(&self, key: &str, value: serde_json::Value, ttl: Duration)
    -> Result<()>;

    /// Removes a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
