//! Consent grant records.
//!
//! A consent grant records that a user approved a set of scopes for an
//! application. Grants carry a fixed lifetime and are never updated in
//! place: each approval inserts a new record, and expiry is time-based
//! rather than event-based.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// A user's approval of a scope set for an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentGrant {
    /// Unique grant identifier.
    pub id: Uuid,

    /// The approving user.
    pub user_id: String,

    /// The application the scopes were approved for.
    pub application_id: Uuid,

    /// The approved scopes. A subset of the application's allowed scopes.
    pub scopes: Vec<String>,

    /// Timestamp when the grant was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Timestamp of the last update.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    /// Timestamp after which the grant is no longer valid.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl ConsentGrant {
    /// Creates a new grant expiring `lifetime` from now.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        application_id: Uuid,
        scopes: Vec<String>,
        lifetime: Duration,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            application_id,
            scopes,
            created_at: now,
            updated_at: now,
            expires_at: now + lifetime,
        }
    }

    /// Returns `true` if the grant has expired.
    ///
    /// A grant is valid only while `expires_at` is strictly in the future.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }

    /// Returns `true` if this grant covers all of the requested scopes.
    ///
    /// A broader prior grant satisfies a narrower new request; equality is
    /// not required.
    #[must_use]
    pub fn covers(&self, requested: &[String]) -> bool {
        requested
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }
}
