//! PKCE (Proof Key for Code Exchange) challenge handling.
//!
//! Implements the RFC 7636 challenge formats accepted by the authorization
//! endpoint: `S256` (the default) and `plain`.
//!
//! At authorization time only the challenge *format* is checked; the
//! verifier comparison happens at the token-exchange stage, which redeems
//! the stored challenge.
//!
//! # Example
//!
//! ```
//! use idp_auth::oauth::pkce::{PkceChallenge, PkceChallengeMethod, PkceVerifier};
//!
//! // Client side: derive the challenge from a fresh verifier
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(&verifier);
//!
//! // Server side: validate the received challenge format
//! assert!(
//!     PkceChallenge::validate(challenge.as_str(), PkceChallengeMethod::S256).is_ok()
//! );
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Length of an unpadded base64url-encoded SHA-256 digest.
const S256_CHALLENGE_LEN: usize = 43;

/// Verifier and plain-challenge length bounds per RFC 7636.
const MIN_PLAIN_LEN: usize = 43;
const MAX_PLAIN_LEN: usize = 128;

// =============================================================================
// Challenge Method
// =============================================================================

/// PKCE code challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PkceChallengeMethod {
    /// SHA-256 hash of the verifier, base64url-encoded (the default).
    S256,
    /// The verifier itself, unhashed.
    #[serde(rename = "plain")]
    Plain,
}

impl PkceChallengeMethod {
    /// Parses a challenge method from its query-parameter value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for any value other than `S256` or `plain`.
    pub fn parse(method: &str) -> Result<Self, AuthError> {
        match method {
            "S256" => Ok(Self::S256),
            "plain" => Ok(Self::Plain),
            other => Err(AuthError::invalid_request(format!(
                "Invalid code_challenge_method: {other}"
            ))),
        }
    }

    /// Returns the method as its wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

impl Default for PkceChallengeMethod {
    fn default() -> Self {
        Self::S256
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Challenge
// =============================================================================

/// PKCE code challenge as received in the authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Validates a challenge against the format rules of its method.
    ///
    /// - `S256`: exactly 43 base64url characters (`[A-Za-z0-9_-]`), the
    ///   unpadded encoding of a SHA-256 digest.
    /// - `plain`: length between 43 and 128 characters inclusive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when the challenge does not match the
    /// method's format.
    pub fn validate(challenge: &str, method: PkceChallengeMethod) -> Result<(), AuthError> {
        let ok = match method {
            PkceChallengeMethod::S256 => {
                challenge.len() == S256_CHALLENGE_LEN && challenge.chars().all(is_base64url_char)
            }
            PkceChallengeMethod::Plain => {
                (MIN_PLAIN_LEN..=MAX_PLAIN_LEN).contains(&challenge.len())
            }
        };

        if ok {
            Ok(())
        } else {
            Err(AuthError::invalid_request(format!(
                "Invalid code_challenge for method {method}"
            )))
        }
    }

    /// Creates a validated challenge.
    ///
    /// # Errors
    ///
    /// Same as [`PkceChallenge::validate`].
    pub fn new(challenge: String, method: PkceChallengeMethod) -> Result<Self, AuthError> {
        Self::validate(&challenge, method)?;
        Ok(Self(challenge))
    }

    /// Derives an S256 challenge from a verifier:
    /// `BASE64URL(SHA256(ASCII(code_verifier)))`.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_str().as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    /// Gets the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the challenge and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn is_base64url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

// =============================================================================
// Verifier
// =============================================================================

/// PKCE code verifier, as held by the client.
///
/// Provided here so that integration tests and client tooling can produce
/// well-formed challenges; the authorization endpoint itself never sees
/// the verifier.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generates a cryptographically random verifier: 32 random bytes,
    /// base64url-encoded (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        // `gen` is a reserved keyword in Rust 2024
        let bytes: [u8; 32] = rng.r#gen();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Gets the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
