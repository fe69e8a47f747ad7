//! Consent lifecycle management.
//!
//! Decides whether a prior consent grant satisfies the current request and
//! records new approvals. Validity is evaluated against the most recent
//! unexpired grant: expired grants are invisible to the lookup, so an
//! older still-valid grant keeps satisfying requests even after a newer
//! one has lapsed.
//!
//! The check-then-record sequence is not transactional. Two concurrent
//! requests may both find no valid grant and both record one; the result
//! is two overlapping grants, which is harmless.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use crate::storage::ConsentStorage;
use crate::types::ConsentGrant;

/// Manages consent grants for the authorization endpoint.
pub struct ConsentManager {
    storage: Arc<dyn ConsentStorage>,
    lifetime: time::Duration,
}

impl ConsentManager {
    /// Creates a manager recording grants with the given lifetime.
    #[must_use]
    pub fn new(storage: Arc<dyn ConsentStorage>, lifetime: std::time::Duration) -> Self {
        Self {
            storage,
            lifetime: time::Duration::seconds(lifetime.as_secs() as i64),
        }
    }

    /// Returns `true` if the user's most recent unexpired grant for the
    /// application covers all requested scopes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the store fails.
    pub async fn has_valid_consent(
        &self,
        user_id: &str,
        application_id: Uuid,
        requested: &[String],
    ) -> Result<bool, AuthError> {
        let Some(grant) = self.storage.find_latest(user_id, application_id).await? else {
            debug!(user_id, %application_id, "no unexpired consent grant");
            return Ok(false);
        };

        Ok(grant.covers(requested))
    }

    /// Records a fresh grant for the requested scopes.
    ///
    /// Always inserts a new record, even when a covering grant already
    /// exists, so approvals remain auditable.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the store fails.
    pub async fn record_consent(
        &self,
        user_id: &str,
        application_id: Uuid,
        scopes: Vec<String>,
    ) -> Result<ConsentGrant, AuthError> {
        let grant = ConsentGrant::new(user_id, application_id, scopes, self.lifetime);
        debug!(
            user_id,
            %application_id,
            grant_id = %grant.id,
            "recording consent grant"
        );
        self.storage.insert(grant.clone()).await?;
        Ok(grant)
    }
}
