//! Scope parsing and authorization.
//!
//! The global scope vocabulary is a fixed, explicit set; requested scopes
//! are validated by set membership, first against the vocabulary and then
//! against the application's allow-list. Both checks run over the whole
//! request and report the full offending token list.

use crate::error::AuthError;
use crate::types::Application;

/// The global scope vocabulary.
///
/// Every requested scope must be a member of this set, independent of any
/// per-application grant.
pub const SCOPE_VOCABULARY: [&str; 6] = [
    "openid",
    "profile",
    "email",
    "address",
    "phone",
    "offline_access",
];

/// Returns `true` if the scope is part of the global vocabulary.
#[must_use]
pub fn is_known_scope(scope: &str) -> bool {
    SCOPE_VOCABULARY.contains(&scope)
}

/// Splits a space-delimited scope string into tokens.
#[must_use]
pub fn parse_scopes(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(str::to_string).collect()
}

/// Validates requested scopes against the vocabulary and the application's
/// allow-list.
///
/// Both checks are evaluated over the full token list. Tokens outside the
/// vocabulary are reported first (`invalid_scope`); tokens inside the
/// vocabulary but outside the application's grant are reported as
/// `unauthorized_scope`.
///
/// # Errors
///
/// Returns `InvalidScope` or `UnauthorizedScope` carrying the offending
/// tokens.
pub fn validate_scopes(application: &Application, requested: &[String]) -> Result<(), AuthError> {
    let invalid: Vec<String> = requested
        .iter()
        .filter(|scope| !is_known_scope(scope))
        .cloned()
        .collect();

    let unauthorized: Vec<String> = requested
        .iter()
        .filter(|scope| !application.is_scope_allowed(scope))
        .cloned()
        .collect();

    if !invalid.is_empty() {
        return Err(AuthError::invalid_scope(invalid));
    }

    if !unauthorized.is_empty() {
        return Err(AuthError::unauthorized_scope(unauthorized));
    }

    Ok(())
}
