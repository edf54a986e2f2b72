//! Time-boxed authorization grant.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default grant lifetime in days.
pub const DEFAULT_GRANT_DURATION_DAYS: i64 = 4;

/// Returns the default grant lifetime.
pub fn default_duration() -> Duration {
    Duration::days(DEFAULT_GRANT_DURATION_DAYS)
}

/// A local, time-boxed proof that the current client may skip
/// re-verification.
///
/// Timestamps are RFC 3339 strings. A record whose expiry fails to
/// parse is treated as expired, so malformed grants behave as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    /// Verified subject (e.g., an email address).
    pub subject: String,
    /// Issue timestamp (RFC 3339).
    pub issued_at: String,
    /// Expiry timestamp (RFC 3339).
    pub expires_at: String,
}

impl AuthorizationGrant {
    /// Issues a grant for `subject` valid for `duration` from now.
    pub fn issue(subject: impl Into<String>, duration: Duration) -> Self {
        Self::issue_at(subject, Utc::now(), duration)
    }

    /// Issues a grant with an explicit clock; used by expiry tests.
    pub fn issue_at(subject: impl Into<String>, now: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            subject: subject.into(),
            issued_at: now.to_rfc3339(),
            expires_at: (now + duration).to_rfc3339(),
        }
    }

    /// True iff the grant has not expired at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires) => now < expires.with_timezone(&Utc),
            Err(_) => false,
        }
    }

    /// True iff the grant has not expired.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Pushes `expires_at` forward by the full `duration`. No-op on an
    /// already expired grant; returns whether the grant was extended.
    pub fn extend(&mut self, duration: Duration) -> bool {
        self.extend_at(Utc::now(), duration)
    }

    /// Extension with an explicit clock; used by tests.
    pub fn extend_at(&mut self, now: DateTime<Utc>, duration: Duration) -> bool {
        if !self.is_valid_at(now) {
            return false;
        }
        self.expires_at = (now + duration).to_rfc3339();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_valid_within_duration() {
        let grant = AuthorizationGrant::issue_at("user@example.com", t0(), Duration::days(4));
        assert!(grant.is_valid_at(t0()));
        assert!(grant.is_valid_at(t0() + Duration::days(4) - Duration::seconds(1)));
    }

    #[test]
    fn test_invalid_at_and_after_expiry() {
        let grant = AuthorizationGrant::issue_at("user@example.com", t0(), Duration::days(4));
        assert!(!grant.is_valid_at(t0() + Duration::days(4)));
        assert!(!grant.is_valid_at(t0() + Duration::days(30)));
    }

    #[test]
    fn test_malformed_expiry_is_invalid() {
        let grant = AuthorizationGrant {
            subject: "user@example.com".to_string(),
            issued_at: t0().to_rfc3339(),
            expires_at: "not-a-timestamp".to_string(),
        };
        assert!(!grant.is_valid_at(t0()));
    }

    #[test]
    fn test_extend_pushes_expiry_forward() {
        let mut grant = AuthorizationGrant::issue_at("user@example.com", t0(), Duration::days(4));
        let later = t0() + Duration::days(2);
        assert!(grant.extend_at(later, Duration::days(4)));
        assert!(grant.is_valid_at(later + Duration::days(4) - Duration::seconds(1)));
        assert!(!grant.is_valid_at(later + Duration::days(4)));
    }

    #[test]
    fn test_extend_is_noop_when_expired() {
        let mut grant = AuthorizationGrant::issue_at("user@example.com", t0(), Duration::days(4));
        let before = grant.expires_at.clone();
        assert!(!grant.extend_at(t0() + Duration::days(5), Duration::days(4)));
        assert_eq!(grant.expires_at, before);
    }
}
