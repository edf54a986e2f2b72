//! Assembles the client stack from configuration.

use crate::access_guard::AccessGuard;
use crate::pipeline_runner::PipelineRunner;
use crate::session_usecase::SessionUseCase;
use crate::upload_usecase::UploadUseCase;
use plotline_core::config::ClientConfig;
use plotline_core::retry::RetryPolicy;
use plotline_core::state::StateStore;
use plotline_infrastructure::{ConfigLoader, GrantStore, TomlStateStore};
use plotline_interaction::{PipelineApi, SessionApi};
use std::sync::Arc;
use std::time::Duration;

/// The assembled client: sessions, uploads, and access control behind
/// one constructor.
pub struct PlotlineClient {
    pub sessions: Arc<SessionUseCase>,
    pub uploads: UploadUseCase,
    pub access: AccessGuard,
}

impl PlotlineClient {
    /// Loads configuration from the platform config directory and wires
    /// the stack against the on-disk state store.
    pub fn from_disk() -> anyhow::Result<Self> {
        let config = ConfigLoader::new()?.load_or_init()?;
        let store: Arc<dyn StateStore> = Arc::new(TomlStateStore::new()?);
        Ok(Self::from_config(&config, store))
    }

    /// Wires the stack against any state store. Tests pass the
    /// in-memory store here.
    pub fn from_config(config: &ClientConfig, store: Arc<dyn StateStore>) -> Self {
        tracing::debug!(
            "[PlotlineClient] Wiring against {} (stream timeout {}s)",
            config.api.base_url,
            config.pipeline.stream_timeout_secs
        );

        let session_api = Arc::new(SessionApi::with_timeout(
            &config.api.base_url,
            config.api.api_key.clone(),
            Duration::from_secs(config.api.request_timeout_secs),
        ));
        let pipeline_api = Arc::new(PipelineApi::new(
            &config.api.base_url,
            config.api.api_key.clone(),
        ));

        let policy = RetryPolicy::new(
            config.persistence.retry_attempts,
            Duration::from_millis(config.persistence.retry_base_delay_ms),
        );
        let sessions = Arc::new(SessionUseCase::new(session_api, store.clone(), policy));

        let runner = PipelineRunner::with_timeout(
            pipeline_api,
            Duration::from_secs(config.pipeline.stream_timeout_secs),
        );
        let uploads = UploadUseCase::new(runner, sessions.clone(), store.clone());

        let grants = Arc::new(GrantStore::with_duration(
            store,
            chrono::Duration::days(config.auth.grant_duration_days),
        ));
        let access = AccessGuard::new(grants);

        Self {
            sessions,
            uploads,
            access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotline_infrastructure::MemoryStateStore;

    #[tokio::test]
    async fn test_from_config_wires_a_working_client() {
        let config = ClientConfig::default();
        let client = PlotlineClient::from_config(&config, Arc::new(MemoryStateStore::new()));

        // no network was touched yet: no session, no grant
        assert!(client.sessions.active_session_id().await.is_none());
        assert!(client.access.ensure_valid().await.is_err());
    }

    #[tokio::test]
    async fn test_grant_duration_comes_from_config() {
        let mut config = ClientConfig::default();
        config.auth.grant_duration_days = 1;
        let client = PlotlineClient::from_config(&config, Arc::new(MemoryStateStore::new()));

        let grant = client.access.sign_in("user@example.com").await.unwrap();
        let issued: chrono::DateTime<chrono::Utc> = grant.issued_at.parse().unwrap();
        let expires: chrono::DateTime<chrono::Utc> = grant.expires_at.parse().unwrap();
        assert_eq!(expires - issued, chrono::Duration::days(1));
    }
}
