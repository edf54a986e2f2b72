//! Background message durability with bounded retry.

use plotline_core::retry::RetryPolicy;
use plotline_core::session::{Message, SessionService};
use std::sync::Arc;

/// Persists messages to the remote transcript in the background.
///
/// Persistence is fire-and-forget: the caller has already shown the
/// message locally, so a failed write is logged and dropped rather
/// than surfaced or allowed to block the send path.
pub struct MessagePersistor {
    service: Arc<dyn SessionService>,
    policy: RetryPolicy,
}

impl MessagePersistor {
    pub fn new(service: Arc<dyn SessionService>, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    /// Spawns a background persistence task for `message`.
    pub fn spawn_persist(&self, session_id: String, message: Message) {
        let service = self.service.clone();
        let policy = self.policy;
        tokio::spawn(async move {
            persist(service, policy, session_id, message).await;
        });
    }
}

/// Appends with up to `policy.max_attempts` tries, waiting
/// `attempt * base_delay` between them, then gives up silently.
pub(crate) async fn persist(
    service: Arc<dyn SessionService>,
    policy: RetryPolicy,
    session_id: String,
    message: Message,
) {
    for attempt in 1..=policy.max_attempts {
        match service.append_message(&session_id, &message).await {
            Ok(()) => {
                tracing::debug!(
                    "[MessagePersistor] Persisted message {} on attempt {}",
                    message.id, attempt
                );
                return;
            }
            Err(e) if policy.has_next(attempt) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "[MessagePersistor] Attempt {} failed for message {}: {}; retrying in {:?}",
                    attempt, message.id, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::warn!(
                    "[MessagePersistor] Giving up on message {} after {} attempts: {}",
                    message.id, attempt, e
                );
            }
        }
    }
}
