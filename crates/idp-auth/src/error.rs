//! Authorization error types.
//!
//! This module defines all error types that can occur while processing an
//! authorization request, along with their mapping onto OAuth 2.0 wire
//! error codes.

use std::fmt;

/// Errors that can occur during authorization-request processing.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request is malformed: missing or invalid parameters, a bad
    /// response_type, or a redirect_uri outside the client's allow-list.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The client_id does not match any active registered application.
    /// Never reported via redirect: the claimed redirect_uri is not
    /// authenticated at this point.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// One or more requested scopes are outside the global scope vocabulary.
    #[error("Invalid scope: {}", .scopes.join(", "))]
    InvalidScope {
        /// The offending scope tokens.
        scopes: Vec<String>,
    },

    /// One or more requested scopes are not granted to the application.
    #[error("Unauthorized scope: {}", .scopes.join(", "))]
    UnauthorizedScope {
        /// The offending scope tokens.
        scopes: Vec<String>,
    },

    /// The user declined the authorization request on the consent screen.
    #[error("Consent declined by the user")]
    ConsentDeclined,

    /// An error occurred while reading or writing an external store.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidScope` error from the offending tokens.
    #[must_use]
    pub fn invalid_scope(scopes: Vec<String>) -> Self {
        Self::InvalidScope { scopes }
    }

    /// Creates a new `UnauthorizedScope` error from the offending tokens.
    #[must_use]
    pub fn unauthorized_scope(scopes: Vec<String>) -> Self {
        Self::UnauthorizedScope { scopes }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::InvalidClient { .. }
                | Self::InvalidScope { .. }
                | Self::UnauthorizedScope { .. }
                | Self::ConsentDeclined
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Internal { .. })
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::UnauthorizedScope { .. } => "unauthorized_scope",
            Self::ConsentDeclined => "consent_declined",
            Self::Storage { .. } | Self::Internal { .. } => "server_error",
        }
    }

    /// Returns the redirect error code carried back to the relying party.
    ///
    /// Only meaningful once the redirect target is trusted. `InvalidClient`
    /// maps to `server_error` here but is never redirected by the
    /// orchestrator.
    #[must_use]
    pub fn redirect_code(&self) -> AuthorizationErrorCode {
        match self {
            Self::InvalidRequest { .. } => AuthorizationErrorCode::InvalidRequest,
            Self::InvalidScope { .. } => AuthorizationErrorCode::InvalidScope,
            Self::UnauthorizedScope { .. } => AuthorizationErrorCode::UnauthorizedScope,
            Self::ConsentDeclined => AuthorizationErrorCode::ConsentDeclined,
            Self::InvalidClient { .. } | Self::Storage { .. } | Self::Internal { .. } => {
                AuthorizationErrorCode::ServerError
            }
        }
    }
}

/// Error codes carried in the `error` query parameter of an error redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationErrorCode {
    /// Malformed or missing parameters, bad response_type, bad redirect_uri.
    InvalidRequest,
    /// A requested scope is outside the global vocabulary.
    InvalidScope,
    /// A requested scope is not granted to the application.
    UnauthorizedScope,
    /// The user rejected the request on the consent screen.
    ConsentDeclined,
    /// An unexpected internal or store fault.
    ServerError,
}

impl AuthorizationErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidScope => "invalid_scope",
            Self::UnauthorizedScope => "unauthorized_scope",
            Self::ConsentDeclined => "consent_declined",
            Self::ServerError => "server_error",
        }
    }
}

impl fmt::Display for AuthorizationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_request("missing parameter: state");
        assert_eq!(err.to_string(), "Invalid request: missing parameter: state");

        let err = AuthError::invalid_scope(vec!["hacker_scope".to_string()]);
        assert_eq!(err.to_string(), "Invalid scope: hacker_scope");

        let err =
            AuthError::unauthorized_scope(vec!["email".to_string(), "phone".to_string()]);
        assert_eq!(err.to_string(), "Unauthorized scope: email, phone");

        let err = AuthError::ConsentDeclined;
        assert_eq!(err.to_string(), "Consent declined by the user");
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::invalid_client("unknown").is_client_error());
        assert!(!AuthError::invalid_client("unknown").is_server_error());

        assert!(AuthError::storage("db down").is_server_error());
        assert!(!AuthError::storage("db down").is_client_error());

        assert!(AuthError::ConsentDeclined.is_client_error());
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(
            AuthError::invalid_request("x").oauth_error_code(),
            "invalid_request"
        );
        assert_eq!(
            AuthError::invalid_client("x").oauth_error_code(),
            "invalid_client"
        );
        assert_eq!(
            AuthError::invalid_scope(vec![]).oauth_error_code(),
            "invalid_scope"
        );
        assert_eq!(
            AuthError::unauthorized_scope(vec![]).oauth_error_code(),
            "unauthorized_scope"
        );
        assert_eq!(
            AuthError::ConsentDeclined.oauth_error_code(),
            "consent_declined"
        );
        assert_eq!(AuthError::internal("x").oauth_error_code(), "server_error");
    }

    #[test]
    fn test_redirect_code() {
        assert_eq!(
            AuthError::invalid_request("x").redirect_code(),
            AuthorizationErrorCode::InvalidRequest
        );
        assert_eq!(
            AuthError::unauthorized_scope(vec![]).redirect_code(),
            AuthorizationErrorCode::UnauthorizedScope
        );
        assert_eq!(
            AuthError::storage("x").redirect_code(),
            AuthorizationErrorCode::ServerError
        );
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(
            AuthorizationErrorCode::InvalidRequest.as_str(),
            "invalid_request"
        );
        assert_eq!(
            AuthorizationErrorCode::UnauthorizedScope.as_str(),
            "unauthorized_scope"
        );
        assert_eq!(
            AuthorizationErrorCode::ConsentDeclined.to_string(),
            "consent_declined"
        );
    }
}
