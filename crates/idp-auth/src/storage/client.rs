//! Client application storage.

use async_trait::async_trait;

use crate::error::AuthError;
use crate::types::Application;

/// Read access to the registry of client applications.
///
/// The authorization endpoint only reads the registry; registration and
/// lifecycle management are a separate administrative surface.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Looks up an application by its public `client_id`.
    ///
    /// Returns `Ok(None)` when no application carries the identifier.
    /// Whether inactive applications are returned is up to the backend;
    /// callers must check [`Application::active`] either way.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the backend fails.
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Application>, AuthError>;
}
