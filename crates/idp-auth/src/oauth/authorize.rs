//! Authorization request parsing and redirect construction.
//!
//! This module covers the two pure ends of the authorization endpoint:
//! the parameter validator that turns raw query parameters into a typed
//! [`AuthorizationRequest`], and the redirect builders that turn final or
//! error state into an outbound URL.
//!
//! # OAuth 2.0 Authorization Code Flow
//!
//! The authorization endpoint is the first step in the authorization code
//! flow:
//!
//! 1. Client redirects the user here with request parameters
//! 2. User authenticates and (if required) consents
//! 3. Server redirects back to the client with an authorization code
//! 4. Client exchanges the code for tokens at the token endpoint
//!
//! # Example
//!
//! ```ignore
//! GET /authorize?
//!   response_type=code
//!   &client_id=my-app
//!   &redirect_uri=https://app.example.com/callback
//!   &scope=openid profile
//!   &state=abc123xyz
//!   &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM
//!   &code_challenge_method=S256
//! ```

use serde::Deserialize;
use url::Url;

use crate::error::{AuthError, AuthorizationErrorCode};
use crate::oauth::pkce::PkceChallengeMethod;
use crate::oauth::scopes::parse_scopes;

// =============================================================================
// Raw Query Parameters
// =============================================================================

/// Raw query parameters of an authorization request.
///
/// Every field is optional at this layer so that a malformed request can
/// still be inspected: the error-redirect path needs the raw `state` and
/// redirect URIs even when validation fails. All values arrive as query
/// strings, including the boolean-ish `dontRememberMe`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeParams {
    /// Must be `code`.
    #[serde(default)]
    pub response_type: Option<String>,

    /// Public client identifier.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Redirect URI where the response will be sent.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Requested scopes (space-delimited).
    #[serde(default)]
    pub scope: Option<String>,

    /// Opaque caller-supplied nonce, echoed verbatim.
    #[serde(default)]
    pub state: Option<String>,

    /// PKCE code challenge.
    #[serde(default)]
    pub code_challenge: Option<String>,

    /// PKCE challenge method; defaults to `S256` when absent.
    #[serde(default)]
    pub code_challenge_method: Option<String>,

    /// Where to send synchronous errors instead of `redirect_uri`.
    #[serde(default)]
    pub error_redirect_uri: Option<String>,

    /// Consent decision echoed back from the consent UI.
    #[serde(default)]
    pub consent: Option<String>,

    /// Session-persistence hint; literal `true` or `false`.
    #[serde(default, rename = "dontRememberMe")]
    pub dont_remember_me: Option<String>,
}

impl AuthorizeParams {
    /// Returns the present parameters as query pairs, in wire order.
    ///
    /// Used to carry the original request through the sign-in and consent
    /// redirects so those pages can re-drive it.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("response_type", self.response_type.as_deref()),
            ("client_id", self.client_id.as_deref()),
            ("redirect_uri", self.redirect_uri.as_deref()),
            ("scope", self.scope.as_deref()),
            ("state", self.state.as_deref()),
            ("code_challenge", self.code_challenge.as_deref()),
            ("code_challenge_method", self.code_challenge_method.as_deref()),
            ("error_redirect_uri", self.error_redirect_uri.as_deref()),
            ("consent", self.consent.as_deref()),
            ("dontRememberMe", self.dont_remember_me.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }

    /// Resolves the target for a pre-validation error redirect:
    /// `error_redirect_uri ?? redirect_uri`, restricted to well-formed
    /// absolute URLs. Returns `None` when nothing safe to redirect to
    /// exists, in which case the failure must be terminal.
    #[must_use]
    pub fn error_redirect_target(&self) -> Option<&str> {
        [&self.error_redirect_uri, &self.redirect_uri]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|uri| Url::parse(uri).is_ok())
    }
}

// =============================================================================
// Consent Decision
// =============================================================================

/// Consent decision returned from the consent UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentDecision {
    /// The user approved the requested scopes.
    Granted,
    /// The user rejected the request.
    Decline,
}

impl ConsentDecision {
    /// Parses the `consent` query parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for any value other than `granted` or
    /// `decline`.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        match value {
            "granted" => Ok(Self::Granted),
            "decline" => Ok(Self::Decline),
            other => Err(AuthError::invalid_request(format!(
                "Invalid consent value: {other}"
            ))),
        }
    }
}

// =============================================================================
// Validated Request
// =============================================================================

/// A validated authorization request.
///
/// Produced by [`AuthorizationRequest::parse`] from raw query parameters.
/// Validation here is purely structural; policy checks against the
/// resolved application happen in a later stage.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// The response type as requested. Checked against `code` by the
    /// policy stage.
    pub response_type: String,

    /// Public client identifier.
    pub client_id: String,

    /// Redirect URI; well-formed absolute URL.
    pub redirect_uri: String,

    /// Raw space-delimited scope string.
    pub scope: String,

    /// Parsed scope tokens.
    pub scopes: Vec<String>,

    /// Opaque state, echoed verbatim on every outcome.
    pub state: String,

    /// PKCE code challenge (format checked by the policy stage).
    pub code_challenge: String,

    /// PKCE challenge method.
    pub code_challenge_method: PkceChallengeMethod,

    /// Optional separate target for error redirects.
    pub error_redirect_uri: Option<String>,

    /// Consent decision, when returning from the consent UI.
    pub consent: Option<ConsentDecision>,

    /// When true, the re-issued session cookie is non-persistent.
    pub dont_remember_me: bool,
}

impl AuthorizationRequest {
    /// Parses and type-checks raw query parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` naming the first missing or malformed
    /// parameter. The caller is expected to report the failure via
    /// redirect to [`AuthorizeParams::error_redirect_target`].
    pub fn parse(params: &AuthorizeParams) -> Result<Self, AuthError> {
        let response_type = require(&params.response_type, "response_type")?;
        let client_id = require(&params.client_id, "client_id")?;
        let redirect_uri = require(&params.redirect_uri, "redirect_uri")?;
        let scope = require(&params.scope, "scope")?;
        let state = params
            .state
            .clone()
            .ok_or_else(|| AuthError::invalid_request("Missing required parameter: state"))?;
        let code_challenge = require(&params.code_challenge, "code_challenge")?;

        require_absolute_url(&redirect_uri, "redirect_uri")?;

        let error_redirect_uri = match &params.error_redirect_uri {
            Some(uri) => {
                require_absolute_url(uri, "error_redirect_uri")?;
                Some(uri.clone())
            }
            None => None,
        };

        let code_challenge_method = match params.code_challenge_method.as_deref() {
            Some(method) => PkceChallengeMethod::parse(method)?,
            None => PkceChallengeMethod::default(),
        };

        let consent = match params.consent.as_deref() {
            Some(value) => Some(ConsentDecision::parse(value)?),
            None => None,
        };

        let dont_remember_me = match params.dont_remember_me.as_deref() {
            Some("true") => true,
            Some("false") | None => false,
            Some(other) => {
                return Err(AuthError::invalid_request(format!(
                    "Invalid dontRememberMe value: {other}"
                )));
            }
        };

        let scopes = parse_scopes(&scope);
        if scopes.is_empty() {
            return Err(AuthError::invalid_request("Empty scope"));
        }

        Ok(Self {
            response_type,
            client_id,
            redirect_uri,
            scope,
            scopes,
            state,
            code_challenge,
            code_challenge_method,
            error_redirect_uri,
            consent,
            dont_remember_me,
        })
    }

    /// The target for error redirects once the request is validated:
    /// `error_redirect_uri ?? redirect_uri`.
    #[must_use]
    pub fn error_redirect_target(&self) -> &str {
        self.error_redirect_uri
            .as_deref()
            .unwrap_or(&self.redirect_uri)
    }
}

fn require(value: &Option<String>, name: &str) -> Result<String, AuthError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AuthError::invalid_request(format!("Missing required parameter: {name}")))
}

fn require_absolute_url(value: &str, name: &str) -> Result<(), AuthError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|_| AuthError::invalid_request(format!("{name} must be an absolute URL")))
}

// =============================================================================
// Redirect Dispatcher
// =============================================================================

/// Successful authorization response parameters.
///
/// Rendered onto the redirect URI as `code` and `state` query parameters.
#[derive(Debug, Clone)]
pub struct AuthorizationResponse {
    /// Authorization code to be exchanged for tokens.
    pub code: String,

    /// Echoed state parameter.
    pub state: String,
}

impl AuthorizationResponse {
    /// Creates a new authorization response.
    #[must_use]
    pub fn new(code: String, state: String) -> Self {
        Self { code, state }
    }

    /// Builds the redirect URL with response parameters.
    ///
    /// Parameters are merged into any query string the base URL already
    /// carries.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect URI cannot be parsed.
    pub fn to_redirect_url(&self, redirect_uri: &str) -> Result<String, url::ParseError> {
        append_query_pairs(redirect_uri, &[("code", &self.code), ("state", &self.state)])
    }
}

/// Error response parameters, rendered as `error` and `state`.
///
/// `state` is always echoed, including when it is empty, so the relying
/// party can correlate the response even on failure.
#[derive(Debug, Clone)]
pub struct AuthorizationError {
    /// Wire error code.
    pub error: AuthorizationErrorCode,

    /// Echoed state parameter.
    pub state: String,
}

impl AuthorizationError {
    /// Creates a new error response.
    #[must_use]
    pub fn new(error: AuthorizationErrorCode, state: String) -> Self {
        Self { error, state }
    }

    /// Builds the redirect URL with error parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect URI cannot be parsed.
    pub fn to_redirect_url(&self, redirect_uri: &str) -> Result<String, url::ParseError> {
        append_query_pairs(
            redirect_uri,
            &[("error", self.error.as_str()), ("state", &self.state)],
        )
    }
}

/// Appends query pairs to a base URL, merging with any existing query.
///
/// # Errors
///
/// Returns an error if the base URL cannot be parsed.
pub fn append_query_pairs(base: &str, pairs: &[(&str, &str)]) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    {
        let mut query = url.query_pairs_mut();
        for (name, value) in pairs {
            query.append_pair(name, value);
        }
    }
    Ok(url.to_string())
}
