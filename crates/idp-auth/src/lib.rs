//! # idp-auth
//!
//! OAuth 2.0 / OIDC authorization endpoint for the IdP server.
//!
//! This crate implements the authorization-request phase of the
//! Authorization Code flow with PKCE: it validates incoming requests,
//! resolves the client application, enforces scope and redirect policy,
//! drives the sign-in and consent handoffs, and finalizes successful
//! requests by minting a single-use authorization code.
//!
//! ## Overview
//!
//! Authentication itself lives outside this crate. An external session
//! subsystem (behind [`session::SessionProvider`]) owns sign-in; the
//! endpoint only resolves the session cookie and re-issues it. All
//! persistence is injected through the traits in [`storage`].
//!
//! ## Modules
//!
//! - [`config`] - Endpoint configuration (URLs, consent policy, lifetimes)
//! - [`error`] - Error types and OAuth wire error codes
//! - [`oauth`] - Request validation, PKCE, scopes, consent, orchestration
//! - [`session`] - Bridge to the external session subsystem
//! - [`storage`] - Storage traits for clients, consents, and codes
//! - [`types`] - Domain records (applications, consent grants)
//! - [`http`] - Axum handler for GET /authorize

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod session;
pub mod storage;
pub mod types;

pub use config::IdpConfig;
pub use error::{AuthError, AuthorizationErrorCode};
pub use http::{AuthorizeState, authorize_get, router};
pub use oauth::{
    AuthorizationCode, AuthorizationRequest, AuthorizationService, AuthorizeOutcome,
    AuthorizeParams, ConsentManager,
};
pub use session::{SessionCookie, SessionProvider, UserSession};
pub use storage::{AuthorizationCodeStorage, ClientStorage, ConsentStorage};
pub use types::{Application, ConsentGrant};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use idp_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::IdpConfig;
    pub use crate::error::{AuthError, AuthorizationErrorCode};
    pub use crate::oauth::{
        AuthorizationCode, AuthorizationRequest, AuthorizationService, AuthorizeOutcome,
        AuthorizeParams, ConsentManager, PkceChallenge, PkceChallengeMethod,
    };
    pub use crate::session::{SessionCookie, SessionProvider, UserSession};
    pub use crate::storage::{AuthorizationCodeStorage, ClientStorage, ConsentStorage};
    pub use crate::types::{Application, ConsentGrant};
}
