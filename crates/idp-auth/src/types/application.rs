//! Registered OAuth client applications.
//!
//! An `Application` is a relying party registered with the identity
//! provider. Registrations are created and maintained by an out-of-scope
//! admin process; this crate only reads them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A registered OAuth client application.
///
/// The `client_secret` is write-only: it is accepted on deserialization
/// but never serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Internal identifier.
    pub id: Uuid,

    /// Human-readable display name, shown on the consent screen.
    pub name: String,

    /// Public client identifier used in OAuth flows. Globally unique.
    pub client_id: String,

    /// Confidential client secret. Never exposed in API responses.
    #[serde(default, skip_serializing)]
    pub client_secret: String,

    /// Allowed redirect URIs. Matched by exact string comparison.
    pub redirect_uris: Vec<String>,

    /// Scopes this application is allowed to request.
    pub allowed_scopes: Vec<String>,

    /// Whether this application is currently active.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Timestamp when the application was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Timestamp of the last registration update.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn default_active() -> bool {
    true
}

impl Application {
    /// Validates the registration invariants.
    ///
    /// An active application must carry a non-empty client_id, at least one
    /// redirect URI, and at least one allowed scope.
    ///
    /// # Errors
    ///
    /// Returns an error describing the violated invariant.
    pub fn validate(&self) -> Result<(), ApplicationValidationError> {
        if self.client_id.is_empty() {
            return Err(ApplicationValidationError::EmptyClientId);
        }

        if self.name.is_empty() {
            return Err(ApplicationValidationError::EmptyName);
        }

        if self.redirect_uris.is_empty() {
            return Err(ApplicationValidationError::NoRedirectUris);
        }

        if self.allowed_scopes.is_empty() {
            return Err(ApplicationValidationError::NoAllowedScopes);
        }

        Ok(())
    }

    /// Checks if the given redirect URI is registered for this application.
    ///
    /// Exact set membership only; no pattern or prefix matching.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Checks if the given scope is granted to this application.
    #[must_use]
    pub fn is_scope_allowed(&self, scope: &str) -> bool {
        self.allowed_scopes.iter().any(|allowed| allowed == scope)
    }
}

/// Errors that can occur during application validation.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// Application name cannot be empty.
    #[error("Application name cannot be empty")]
    EmptyName,

    /// At least one redirect URI is required.
    #[error("At least one redirect URI is required")]
    NoRedirectUris,

    /// At least one allowed scope is required.
    #[error("At least one allowed scope is required")]
    NoAllowedScopes,
}
