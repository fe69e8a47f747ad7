//! HTTP handler for the authorization endpoint.
//!
//! Thin transport layer over [`AuthorizationService`]: it extracts the
//! session token from the cookie jar, hands the raw query parameters to
//! the service, and maps the outcome onto an HTTP response.
//!
//! # Flow
//!
//! ```text
//! GET /authorize?client_id=...&redirect_uri=...
//!     ├─► Unknown/inactive client → 400 JSON (no redirect)
//!     ├─► Malformed, no redirect target → 400 JSON
//!     ├─► No session → 302 to sign-in page
//!     ├─► Consent needed → 302 to consent page
//!     ├─► Any other failure → 302 to redirect target with ?error=...
//!     └─► Success → 302 with ?code=...&state=..., session cookie re-set
//! ```

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use serde_json::json;

use crate::oauth::authorize::AuthorizeParams;
use crate::oauth::service::{AuthorizationService, AuthorizeOutcome};
use crate::session::SessionCookie;

/// State for the authorize handler.
#[derive(Clone)]
pub struct AuthorizeState {
    /// The authorization service.
    pub service: Arc<AuthorizationService>,
}

/// Builds a router exposing the authorization endpoint at the configured
/// path.
pub fn router(service: Arc<AuthorizationService>) -> axum::Router {
    let path = service.config().authorize_path.clone();
    axum::Router::new()
        .route(&path, get(authorize_get))
        .with_state(AuthorizeState { service })
}

/// GET /authorize handler.
pub async fn authorize_get(
    State(state): State<AuthorizeState>,
    Query(params): Query<AuthorizeParams>,
    jar: CookieJar,
) -> Response {
    let cookie_name = &state.service.config().session_cookie_name;
    let session_token = jar.get(cookie_name).map(|cookie| cookie.value().to_string());

    match state
        .service
        .authorize(&params, session_token.as_deref())
        .await
    {
        AuthorizeOutcome::Redirect { url } => Redirect::to(&url).into_response(),
        AuthorizeOutcome::Finalized {
            url,
            session_cookie,
        } => {
            let jar = jar.add(build_cookie(session_cookie));
            (jar, Redirect::to(&url)).into_response()
        }
        AuthorizeOutcome::Rejected { error } => {
            let status = if error.is_server_error() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::BAD_REQUEST
            };
            let body = json!({
                "error": error.oauth_error_code(),
                "error_description": error.to_string(),
            });
            (status, Json(body)).into_response()
        }
    }
}

/// Builds the response cookie from the provider-issued session cookie.
///
/// The endpoint is always reached cross-site (the relying party redirects
/// the browser here), so the cookie must be `SameSite=None` and therefore
/// `Secure`.
fn build_cookie(session_cookie: SessionCookie) -> Cookie<'static> {
    let mut builder = Cookie::build((session_cookie.name, session_cookie.value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/");

    if let Some(max_age) = session_cookie.max_age {
        builder = builder.max_age(time::Duration::seconds(max_age.as_secs() as i64));
    }

    builder.build()
}
