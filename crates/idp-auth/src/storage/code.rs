//! Authorization code storage.

use async_trait::async_trait;

use crate::error::AuthError;
use crate::oauth::code::AuthorizationCode;

/// Persistence for minted authorization codes.
#[async_trait]
pub trait AuthorizationCodeStorage: Send + Sync {
    /// Stores a freshly minted code.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the backend fails.
    async fn create(&self, code: AuthorizationCode) -> Result<(), AuthError>;

    /// Atomically marks a code as consumed and returns its record.
    ///
    /// Used by the token-exchange stage. Codes are single-use: a second
    /// consume of the same value, or a consume after expiry, must fail.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidRequest`] for an unknown, expired, or
    /// already-consumed code, and [`AuthError::Storage`] when the backend
    /// fails.
    async fn consume(&self, code: &str) -> Result<AuthorizationCode, AuthError>;
}
