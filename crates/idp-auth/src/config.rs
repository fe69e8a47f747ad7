//! Identity-provider configuration.
//!
//! Configuration for the authorization endpoint: the URLs of the external
//! sign-in and consent pages, the consent policy, and the lifetimes of the
//! records this crate mints.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the authorization endpoint.
///
/// # Example (TOML)
///
/// ```toml
/// [idp]
/// base_url = "https://auth.example.com"
/// skip_consent = false
/// consent_lifetime = "30d"
/// authorization_code_lifetime = "10m"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdpConfig {
    /// Public base URL of the identity provider.
    /// Used to build the `callback_url` handed to the sign-in and consent
    /// pages so they can re-drive the original authorization request.
    pub base_url: String,

    /// Path of the authorization endpoint under `base_url`.
    pub authorize_path: String,

    /// Sign-in page URL. Either an absolute URL or a path under `base_url`.
    pub sign_in_url: String,

    /// Consent page URL. Either an absolute URL or a path under `base_url`.
    pub consent_url: String,

    /// Skip the consent screen entirely.
    /// When true (the default) every authenticated request finalizes
    /// without consulting or recording consent grants.
    pub skip_consent: bool,

    /// Authorization code lifetime.
    /// Codes are single-use and should be short-lived.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Lifetime of a recorded consent grant.
    #[serde(with = "humantime_serde")]
    pub consent_lifetime: Duration,

    /// Name of the session cookie read from and re-issued to the browser.
    pub session_cookie_name: String,
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            authorize_path: "/authorize".to_string(),
            sign_in_url: "/sign-in".to_string(),
            consent_url: "/consent".to_string(),
            skip_consent: true,
            authorization_code_lifetime: Duration::from_secs(600), // 10 minutes
            consent_lifetime: Duration::from_secs(30 * 24 * 3600), // 30 days
            session_cookie_name: "idp_session".to_string(),
        }
    }
}

impl IdpConfig {
    /// Enables the consent screen.
    #[must_use]
    pub fn with_consent_screen(mut self) -> Self {
        self.skip_consent = false;
        self
    }

    /// Overrides the sign-in page URL.
    #[must_use]
    pub fn with_sign_in_url(mut self, url: impl Into<String>) -> Self {
        self.sign_in_url = url.into();
        self
    }

    /// Overrides the consent page URL.
    #[must_use]
    pub fn with_consent_url(mut self, url: impl Into<String>) -> Self {
        self.consent_url = url.into();
        self
    }

    /// The absolute URL of the authorization endpoint, advertised as
    /// `callback_url` to the sign-in and consent pages.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.base_url, self.authorize_path)
    }

    /// Resolves a configured URL: absolute URLs are used verbatim, paths
    /// are joined onto `base_url`.
    #[must_use]
    pub fn resolve_url(&self, url_or_path: &str) -> String {
        if url_or_path.starts_with("http://") || url_or_path.starts_with("https://") {
            url_or_path.to_string()
        } else {
            format!("{}{}", self.base_url, url_or_path)
        }
    }
}
