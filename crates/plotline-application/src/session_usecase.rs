//! Conversation session lifecycle.
//!
//! Holds the single active session, resumes it from the cached id on
//! startup, and creates a new one exactly once even when several
//! callers race at launch.

use plotline_core::retry::RetryPolicy;
use plotline_core::session::{Message, MessageDurability, Session, SessionService};
use plotline_core::state::{keys, StateStore};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::message_persistor::MessagePersistor;

/// Coordinates the active conversation session.
pub struct SessionUseCase {
    service: Arc<dyn SessionService>,
    store: Arc<dyn StateStore>,
    persistor: MessagePersistor,
    session: RwLock<Option<Session>>,
    init_lock: Mutex<()>,
}

impl SessionUseCase {
    pub fn new(
        service: Arc<dyn SessionService>,
        store: Arc<dyn StateStore>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            persistor: MessagePersistor::new(service.clone(), retry_policy),
            service,
            store,
            session: RwLock::new(None),
            init_lock: Mutex::new(()),
        }
    }

    /// Returns the active session id for `owner_id`, resuming from the
    /// cached id when possible and creating a new session otherwise.
    ///
    /// Concurrent callers are serialized on an internal lock; whoever
    /// enters first does the work and the rest observe its result, so
    /// a burst of calls at launch yields exactly one session.
    pub async fn resume_or_create(&self, owner_id: &str) -> anyhow::Result<String> {
        // fast path: already resolved for this owner
        {
            let session = self.session.read().await;
            if let Some(session) = session.as_ref() {
                if session.owner_id == owner_id {
                    return Ok(session.id.clone());
                }
            }
        }

        let _guard = self.init_lock.lock().await;

        // re-check: another caller may have resolved while we waited
        {
            let session = self.session.read().await;
            if let Some(session) = session.as_ref() {
                if session.owner_id == owner_id {
                    return Ok(session.id.clone());
                }
            }
        }

        if let Some(session_id) = self.cached_session_id(owner_id).await {
            match self.service.fetch_messages(&session_id).await {
                Ok(messages) => {
                    tracing::info!(
                        "[SessionUseCase] Resumed session {} with {} messages",
                        session_id,
                        messages.len()
                    );
                    let mut restored = Session::new(session_id.clone(), owner_id);
                    restored.messages = messages;
                    *self.session.write().await = Some(restored);
                    return Ok(session_id);
                }
                Err(e) => {
                    tracing::warn!(
                        "[SessionUseCase] Failed to resume session {}: {}; starting fresh",
                        session_id,
                        e
                    );
                    self.purge_cache().await;
                }
            }
        }

        let session_id = self.service.create_session(owner_id).await?;
        tracing::info!("[SessionUseCase] Created session {}", session_id);
        self.cache_session(&session_id, owner_id).await;
        *self.session.write().await = Some(Session::new(session_id.clone(), owner_id));
        Ok(session_id)
    }

    /// Adds a message to the in-memory transcript immediately and, for
    /// durable messages, schedules background persistence.
    pub async fn append_message(
        &self,
        message: Message,
        durability: MessageDurability,
    ) -> anyhow::Result<()> {
        let mut session = self.session.write().await;
        let session = session
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("No active session"))?;

        session.messages.push(message.clone());
        if durability == MessageDurability::Durable {
            self.persistor.spawn_persist(session.id.clone(), message);
        }
        Ok(())
    }

    /// Best-effort remote title update. Failure is logged, never
    /// retried, never surfaced.
    pub async fn update_title(&self, title: &str) -> anyhow::Result<()> {
        let session_id = {
            let mut session = self.session.write().await;
            let session = session
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("No active session"))?;
            session.title = title.to_string();
            session.id.clone()
        };

        if let Err(e) = self.service.update_title(&session_id, title).await {
            tracing::warn!(
                "[SessionUseCase] Title update failed for {}: {}",
                session_id,
                e
            );
        }
        Ok(())
    }

    /// Forgets the active session and purges the cached identifiers.
    ///
    /// Used on sign-out, on resume failure, and on an explicit "new
    /// conversation".
    pub async fn clear(&self) {
        *self.session.write().await = None;
        self.purge_cache().await;
    }

    /// Id of the active session, if one is resolved.
    pub async fn active_session_id(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.id.clone())
    }

    /// A snapshot of the active session for rendering.
    pub async fn snapshot(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// The cached session id, provided it belongs to `owner_id`.
    ///
    /// A cached id recorded for a different owner is purged on sight;
    /// a session must never leak across accounts.
    async fn cached_session_id(&self, owner_id: &str) -> Option<String> {
        let session_id = self.read_string(keys::SESSION_ID).await?;
        let owner = self.read_string(keys::SESSION_OWNER).await;
        if owner.as_deref() == Some(owner_id) {
            Some(session_id)
        } else {
            tracing::debug!(
                "[SessionUseCase] Cached session belongs to a different owner, purging"
            );
            self.purge_cache().await;
            None
        }
    }

    async fn read_string(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value.and_then(|v| v.as_str().map(str::to_string)),
            Err(e) => {
                tracing::warn!("[SessionUseCase] Failed to read {}: {}", key, e);
                None
            }
        }
    }

    /// The cache is best-effort: a write failure costs a resume on the
    /// next launch, nothing more.
    async fn cache_session(&self, session_id: &str, owner_id: &str) {
        if let Err(e) = self.store.put(keys::SESSION_ID, json!(session_id)).await {
            tracing::warn!("[SessionUseCase] Failed to cache session id: {}", e);
        }
        if let Err(e) = self.store.put(keys::SESSION_OWNER, json!(owner_id)).await {
            tracing::warn!("[SessionUseCase] Failed to cache session owner: {}", e);
        }
    }

    async fn purge_cache(&self) {
        for key in [keys::SESSION_ID, keys::SESSION_OWNER] {
            if let Err(e) = self.store.remove(key).await {
                tracing::warn!("[SessionUseCase] Failed to remove {}: {}", key, e);
            }
        }
    }
}
