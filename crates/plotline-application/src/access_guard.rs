//! Gates client operations behind a live authorization grant.

use plotline_core::auth::AuthorizationGrant;
use plotline_core::error::{PlotlineError, Result};
use plotline_infrastructure::GrantStore;
use std::sync::Arc;

/// Answers "may this client act right now?" from the stored grant.
pub struct AccessGuard {
    grants: Arc<GrantStore>,
}

impl AccessGuard {
    pub fn new(grants: Arc<GrantStore>) -> Self {
        Self { grants }
    }

    /// Returns the live grant, or an unauthorized error the caller
    /// should surface as a sign-in prompt.
    pub async fn ensure_valid(&self) -> Result<AuthorizationGrant> {
        match self.grants.current().await? {
            Some(grant) => Ok(grant),
            None => {
                tracing::debug!("[AccessGuard] No live grant; sign-in required");
                Err(PlotlineError::unauthorized(
                    "authorization grant missing or expired",
                ))
            }
        }
    }

    /// Records a fresh grant for the subject. Called after the identity
    /// flow has verified them externally.
    pub async fn sign_in(&self, subject: &str) -> Result<AuthorizationGrant> {
        tracing::info!("[AccessGuard] Signing in {}", subject);
        self.grants.issue(subject).await
    }

    /// Pushes the current grant's expiry forward. Returns `None` when
    /// there is nothing live to extend.
    pub async fn keep_alive(&self) -> Result<Option<AuthorizationGrant>> {
        self.grants.extend().await
    }

    /// Drops the grant. Clearing conversation state is the caller's
    /// job; access and sessions are separate concerns.
    pub async fn sign_out(&self) -> Result<()> {
        tracing::info!("[AccessGuard] Signing out");
        self.grants.clear().await
    }
}
