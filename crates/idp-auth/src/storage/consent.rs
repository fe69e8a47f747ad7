//! Consent grant storage.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AuthError;
use crate::types::ConsentGrant;

/// Persistence for consent grants.
///
/// Grants are insert-only: re-consent creates a new record rather than
/// extending an old one, so the store keeps an audit trail of approvals.
#[async_trait]
pub trait ConsentStorage: Send + Sync {
    /// Returns the most recently created unexpired grant for the
    /// user/application pair. Expired grants are filtered out by the
    /// backend (`expires_at` must be in the future). `Ok(None)` when no
    /// unexpired grant exists.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the backend fails.
    async fn find_latest(
        &self,
        user_id: &str,
        application_id: Uuid,
    ) -> Result<Option<ConsentGrant>, AuthError>;

    /// Inserts a new grant.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the backend fails.
    async fn insert(&self, grant: ConsentGrant) -> Result<(), AuthError>;
}
