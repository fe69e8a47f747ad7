//! Authorization code artifacts.
//!
//! The authorization code is the short-lived, single-use credential handed
//! back to the relying party on a successful authorization, later redeemed
//! at the token-exchange stage. It binds the authenticated user, the
//! application, the PKCE challenge, and the granted scopes.
//!
//! # Security
//!
//! - Codes are 256-bit random values, base64url-encoded
//! - Codes expire after a short time (default 10 minutes)
//! - Codes are single-use: consumption is recorded and checked

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::oauth::pkce::PkceChallengeMethod;

/// A minted authorization code awaiting redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// Unique record identifier.
    pub id: Uuid,

    /// The code value returned to the relying party. One-time use.
    pub code: String,

    /// The authenticated user the code was issued for.
    pub user_id: String,

    /// The application the code was issued to.
    pub application_id: Uuid,

    /// The scopes granted to this authorization.
    pub scopes: Vec<String>,

    /// PKCE challenge to verify against at token exchange.
    pub code_challenge: String,

    /// PKCE challenge method.
    pub code_challenge_method: PkceChallengeMethod,

    /// Timestamp when the code was minted.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Timestamp after which the code can no longer be redeemed.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// Timestamp when the code was redeemed. None until redemption.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub consumed_at: Option<OffsetDateTime>,
}

impl AuthorizationCode {
    /// Mints a new code for the given user and application.
    #[must_use]
    pub fn issue(
        user_id: impl Into<String>,
        application_id: Uuid,
        scopes: Vec<String>,
        code_challenge: impl Into<String>,
        code_challenge_method: PkceChallengeMethod,
        lifetime: Duration,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            code: Self::generate_code(),
            user_id: user_id.into(),
            application_id,
            scopes,
            code_challenge: code_challenge.into(),
            code_challenge_method,
            created_at: now,
            expires_at: now + lifetime,
            consumed_at: None,
        }
    }

    /// Generates a cryptographically secure code value.
    ///
    /// 32 bytes of random data, base64url-encoded without padding
    /// (43 characters, 256 bits of entropy).
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Returns `true` if the code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Returns `true` if the code has been redeemed.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Returns `true` if the code can still be redeemed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired() && !self.is_consumed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_test_code(lifetime: Duration) -> AuthorizationCode {
        AuthorizationCode::issue(
            "user-1",
            Uuid::new_v4(),
            vec!["openid".to_string()],
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
            PkceChallengeMethod::S256,
            lifetime,
        )
    }

    #[test]
    fn test_generate_code_shape() {
        let code = AuthorizationCode::generate_code();
        assert_eq!(code.len(), 43);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_code_uniqueness() {
        let codes: Vec<String> = (0..100).map(|_| AuthorizationCode::generate_code()).collect();
        let mut unique = codes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(codes.len(), unique.len());
    }

    #[test]
    fn test_issue_sets_lifetime() {
        let code = issue_test_code(Duration::minutes(10));
        assert_eq!(code.expires_at - code.created_at, Duration::minutes(10));
        assert!(code.is_valid());
    }

    #[test]
    fn test_expired_code_is_invalid() {
        let mut code = issue_test_code(Duration::minutes(10));
        code.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);
        assert!(code.is_expired());
        assert!(!code.is_valid());
    }

    #[test]
    fn test_consumed_code_is_invalid() {
        let mut code = issue_test_code(Duration::minutes(10));
        code.consumed_at = Some(OffsetDateTime::now_utc());
        assert!(code.is_consumed());
        assert!(!code.is_valid());
    }
}
