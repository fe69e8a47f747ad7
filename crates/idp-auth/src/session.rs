//! Session provider integration.
//!
//! Authentication itself lives outside this crate: an external session
//! subsystem signs users in and manages their tokens. The authorization
//! endpoint only needs two things from it, expressed by the
//! [`SessionProvider`] trait: resolve a bearer token from the session
//! cookie into a user, and re-issue the cookie so its lifetime tracks the
//! user's persistence choice.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::AuthError;

/// An authenticated user session, as resolved from a session token.
#[derive(Debug, Clone)]
pub struct UserSession {
    /// The authenticated user.
    pub user_id: String,

    /// The opaque session token the session was resolved from.
    pub token: String,
}

/// A session cookie to be set on the HTTP response.
///
/// The transport layer applies the security attributes (`HttpOnly`,
/// `Secure`, `SameSite=None`); the provider decides value and lifetime.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,

    /// Cookie value.
    pub value: String,

    /// Cookie lifetime. `None` makes the cookie session-scoped, dropped
    /// when the browser closes.
    pub max_age: Option<Duration>,
}

/// Bridge to the external session subsystem.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolves a session token into an authenticated session.
    ///
    /// Returns `Ok(None)` for an unknown or expired token; the caller
    /// treats that the same as no token at all.
    ///
    /// # Errors
    ///
    /// Returns an error when the session subsystem itself fails.
    async fn resolve(&self, token: &str) -> Result<Option<UserSession>, AuthError>;

    /// Re-issues the session cookie for an authenticated session.
    ///
    /// When `remember` is false the provider must return a session-scoped
    /// cookie (`max_age: None`).
    ///
    /// # Errors
    ///
    /// Returns an error when the session subsystem itself fails.
    async fn issue_cookie(
        &self,
        session: &UserSession,
        remember: bool,
    ) -> Result<SessionCookie, AuthError>;
}
