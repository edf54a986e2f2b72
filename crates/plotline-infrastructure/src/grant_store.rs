//! Authorization grant persistence and lifecycle.
//!
//! Wraps the state store with grant-specific rules: records expire
//! after a fixed duration, an expired or unreadable record is purged
//! the moment it is observed, and clearing also removes key names used
//! by earlier releases so a stale record cannot resurrect access.

use chrono::Duration;
use plotline_core::auth::{default_duration, AuthorizationGrant};
use plotline_core::error::{PlotlineError, Result};
use plotline_core::state::{keys, StateStore};
use std::sync::Arc;

/// Stores the local authorization grant.
pub struct GrantStore {
    store: Arc<dyn StateStore>,
    duration: Duration,
}

impl GrantStore {
    /// Creates a grant store with the default grant lifetime.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self::with_duration(store, default_duration())
    }

    /// Creates a grant store with an explicit lifetime; used by config
    /// overrides and expiry tests.
    pub fn with_duration(store: Arc<dyn StateStore>, duration: Duration) -> Self {
        Self { store, duration }
    }

    fn ttl(&self) -> Result<std::time::Duration> {
        self.duration
            .to_std()
            .map_err(|e| PlotlineError::internal(format!("Grant duration out of range: {}", e)))
    }

    /// Issues a fresh grant for `subject`, replacing any existing one.
    pub async fn issue(&self, subject: &str) -> Result<AuthorizationGrant> {
        let grant = AuthorizationGrant::issue(subject, self.duration);
        self.store
            .put_with_ttl(keys::AUTH_GRANT, serde_json::to_value(&grant)?, self.ttl()?)
            .await?;
        tracing::debug!(
            "[GrantStore] Issued grant valid until {}",
            grant.expires_at
        );
        Ok(grant)
    }

    /// Returns the current valid grant, if any.
    ///
    /// Expired and unreadable records are purged before returning, so
    /// every read after expiry behaves like the first.
    pub async fn current(&self) -> Result<Option<AuthorizationGrant>> {
        let Some(value) = self.store.get(keys::AUTH_GRANT).await? else {
            return Ok(None);
        };

        let grant: AuthorizationGrant = match serde_json::from_value(value) {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!("[GrantStore] Purging unreadable grant record: {}", e);
                self.clear().await?;
                return Ok(None);
            }
        };

        if !grant.is_valid() {
            tracing::debug!("[GrantStore] Purging expired grant");
            self.clear().await?;
            return Ok(None);
        }

        Ok(Some(grant))
    }

    /// Pushes the current grant's expiry forward by the full lifetime.
    ///
    /// Returns the extended grant, or `None` when there is nothing
    /// valid to extend.
    pub async fn extend(&self) -> Result<Option<AuthorizationGrant>> {
        let Some(mut grant) = self.current().await? else {
            return Ok(None);
        };
        if !grant.extend(self.duration) {
            return Ok(None);
        }

        self.store
            .put_with_ttl(keys::AUTH_GRANT, serde_json::to_value(&grant)?, self.ttl()?)
            .await?;
        tracing::debug!(
            "[GrantStore] Extended grant until {}",
            grant.expires_at
        );
        Ok(Some(grant))
    }

    /// Removes the grant record along with legacy key names.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(keys::AUTH_GRANT).await?;
        for key in keys::LEGACY_GRANT_KEYS {
            self.store.remove(key).await?;
        }
        Ok(())
    }
}
