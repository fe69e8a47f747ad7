//! Authorization endpoint orchestration.
//!
//! [`AuthorizationService`] drives a request through the full pipeline:
//! parameter validation, client resolution, policy validation, session
//! check, consent, and finalization. Every outcome is a redirect except
//! two terminal cases: an unresolvable client (the claimed redirect URI
//! cannot be trusted, so redirecting would be an open-redirect vector) and
//! a malformed request that carries no usable redirect target at all.

use std::sync::Arc;

use time::Duration;
use tracing::{debug, info, warn};

use crate::config::IdpConfig;
use crate::error::{AuthError, AuthorizationErrorCode};
use crate::oauth::authorize::{
    AuthorizationError, AuthorizationRequest, AuthorizationResponse, AuthorizeParams,
    ConsentDecision, append_query_pairs,
};
use crate::oauth::code::AuthorizationCode;
use crate::oauth::consent::ConsentManager;
use crate::oauth::pkce::PkceChallenge;
use crate::oauth::scopes::validate_scopes;
use crate::session::{SessionCookie, SessionProvider, UserSession};
use crate::storage::{AuthorizationCodeStorage, ClientStorage};
use crate::types::Application;

/// Outcome of an authorization request.
#[derive(Debug)]
pub enum AuthorizeOutcome {
    /// Redirect the user agent. Covers sign-in, consent, and error
    /// redirects.
    Redirect {
        /// Target URL.
        url: String,
    },

    /// Successful authorization: redirect carrying the authorization code,
    /// with the session cookie re-issued alongside.
    Finalized {
        /// Redirect URL carrying `code` and `state`.
        url: String,
        /// Session cookie to set on the response.
        session_cookie: SessionCookie,
    },

    /// Terminal failure answered directly, without a redirect.
    Rejected {
        /// The underlying error.
        error: AuthError,
    },
}

/// The authorization endpoint service.
///
/// All storage and the session subsystem are injected; the service holds
/// the flow logic only.
pub struct AuthorizationService {
    clients: Arc<dyn ClientStorage>,
    codes: Arc<dyn AuthorizationCodeStorage>,
    consent: ConsentManager,
    sessions: Arc<dyn SessionProvider>,
    config: IdpConfig,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientStorage>,
        codes: Arc<dyn AuthorizationCodeStorage>,
        consent: ConsentManager,
        sessions: Arc<dyn SessionProvider>,
        config: IdpConfig,
    ) -> Self {
        Self {
            clients,
            codes,
            consent,
            sessions,
            config,
        }
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &IdpConfig {
        &self.config
    }

    /// Processes an authorization request.
    ///
    /// `session_token` is the value of the session cookie, when present.
    pub async fn authorize(
        &self,
        params: &AuthorizeParams,
        session_token: Option<&str>,
    ) -> AuthorizeOutcome {
        // Stage 1: parameter validation
        let request = match AuthorizationRequest::parse(params) {
            Ok(request) => request,
            Err(error) => {
                warn!(%error, "authorization request failed validation");
                let state = params.state.as_deref().unwrap_or("");
                return match params.error_redirect_target() {
                    Some(target) => error_redirect(target, error.redirect_code(), state),
                    // No well-formed absolute URL to send the error to
                    None => AuthorizeOutcome::Rejected { error },
                };
            }
        };

        // Stage 2: client resolution. Failures here never redirect.
        let application = match self.resolve_client(&request.client_id).await {
            Ok(application) => application,
            Err(error) => {
                warn!(client_id = %request.client_id, %error, "client resolution failed");
                return AuthorizeOutcome::Rejected { error };
            }
        };

        // Stage 3: policy validation against the resolved application
        if let Err(error) = validate_policy(&application, &request) {
            warn!(
                client_id = %request.client_id,
                %error,
                "authorization request failed policy validation"
            );
            return error_redirect(
                request.error_redirect_target(),
                error.redirect_code(),
                &request.state,
            );
        }

        // Stage 4: session
        let session = match self.resolve_session(session_token).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(client_id = %request.client_id, "no session, redirecting to sign-in");
                return self.sign_in_redirect(params, &request);
            }
            Err(error) => {
                warn!(%error, "session resolution failed");
                return error_redirect(
                    request.error_redirect_target(),
                    AuthorizationErrorCode::ServerError,
                    &request.state,
                );
            }
        };

        // Stage 5: consent
        if !self.config.skip_consent {
            match request.consent {
                Some(ConsentDecision::Decline) => {
                    info!(
                        user_id = %session.user_id,
                        client_id = %request.client_id,
                        "user declined consent"
                    );
                    return error_redirect(
                        request.error_redirect_target(),
                        AuthorizationErrorCode::ConsentDeclined,
                        &request.state,
                    );
                }
                Some(ConsentDecision::Granted) => {
                    if let Err(error) = self
                        .consent
                        .record_consent(
                            &session.user_id,
                            application.id,
                            request.scopes.clone(),
                        )
                        .await
                    {
                        warn!(%error, "failed to record consent grant");
                        return error_redirect(
                            request.error_redirect_target(),
                            AuthorizationErrorCode::ServerError,
                            &request.state,
                        );
                    }
                }
                None => {
                    let has_consent = match self
                        .consent
                        .has_valid_consent(&session.user_id, application.id, &request.scopes)
                        .await
                    {
                        Ok(has_consent) => has_consent,
                        Err(error) => {
                            warn!(%error, "consent lookup failed");
                            return error_redirect(
                                request.error_redirect_target(),
                                AuthorizationErrorCode::ServerError,
                                &request.state,
                            );
                        }
                    };

                    if !has_consent {
                        debug!(
                            user_id = %session.user_id,
                            client_id = %request.client_id,
                            "consent required, redirecting to consent page"
                        );
                        return self.consent_redirect(params, &request, &application);
                    }
                }
            }
        }

        // Stage 6: finalize
        self.finalize(&request, &application, &session).await
    }

    async fn resolve_client(&self, client_id: &str) -> Result<Application, AuthError> {
        let application = self
            .clients
            .find_by_client_id(client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("Unknown client_id"))?;

        if !application.active {
            return Err(AuthError::invalid_client("Application is not active"));
        }

        Ok(application)
    }

    async fn resolve_session(
        &self,
        token: Option<&str>,
    ) -> Result<Option<UserSession>, AuthError> {
        match token {
            Some(token) => self.sessions.resolve(token).await,
            None => Ok(None),
        }
    }

    /// Builds the sign-in redirect: the configured sign-in page, carrying
    /// the whole original request plus the callback URL so the page can
    /// re-drive the request after authentication.
    fn sign_in_redirect(
        &self,
        params: &AuthorizeParams,
        request: &AuthorizationRequest,
    ) -> AuthorizeOutcome {
        let callback_url = self.config.callback_url();
        let mut pairs = params.query_pairs();
        pairs.push(("callback_url", &callback_url));

        match append_query_pairs(&self.config.resolve_url(&self.config.sign_in_url), &pairs) {
            Ok(url) => AuthorizeOutcome::Redirect { url },
            Err(_) => error_redirect(
                request.error_redirect_target(),
                AuthorizationErrorCode::ServerError,
                &request.state,
            ),
        }
    }

    /// Builds the consent redirect: the configured consent page, carrying
    /// the original request, the application's display name, and the
    /// callback URL.
    fn consent_redirect(
        &self,
        params: &AuthorizeParams,
        request: &AuthorizationRequest,
        application: &Application,
    ) -> AuthorizeOutcome {
        let callback_url = self.config.callback_url();
        let mut pairs = params.query_pairs();
        pairs.push(("application_name", &application.name));
        pairs.push(("callback_url", &callback_url));

        match append_query_pairs(&self.config.resolve_url(&self.config.consent_url), &pairs) {
            Ok(url) => AuthorizeOutcome::Redirect { url },
            Err(_) => error_redirect(
                request.error_redirect_target(),
                AuthorizationErrorCode::ServerError,
                &request.state,
            ),
        }
    }

    /// Mints and stores the authorization code, re-issues the session
    /// cookie, and builds the final redirect.
    async fn finalize(
        &self,
        request: &AuthorizationRequest,
        application: &Application,
        session: &UserSession,
    ) -> AuthorizeOutcome {
        let lifetime =
            Duration::seconds(self.config.authorization_code_lifetime.as_secs() as i64);
        let code = AuthorizationCode::issue(
            session.user_id.clone(),
            application.id,
            request.scopes.clone(),
            request.code_challenge.clone(),
            request.code_challenge_method,
            lifetime,
        );

        if let Err(error) = self.codes.create(code.clone()).await {
            warn!(%error, "failed to store authorization code");
            return error_redirect(
                request.error_redirect_target(),
                AuthorizationErrorCode::ServerError,
                &request.state,
            );
        }

        let session_cookie = match self
            .sessions
            .issue_cookie(session, !request.dont_remember_me)
            .await
        {
            Ok(cookie) => cookie,
            Err(error) => {
                warn!(%error, "failed to issue session cookie");
                return error_redirect(
                    request.error_redirect_target(),
                    AuthorizationErrorCode::ServerError,
                    &request.state,
                );
            }
        };

        let response = AuthorizationResponse::new(code.code, request.state.clone());
        match response.to_redirect_url(&request.redirect_uri) {
            Ok(url) => {
                info!(
                    user_id = %session.user_id,
                    client_id = %request.client_id,
                    application_id = %application.id,
                    "authorization finalized"
                );
                AuthorizeOutcome::Finalized {
                    url,
                    session_cookie,
                }
            }
            Err(_) => error_redirect(
                request.error_redirect_target(),
                AuthorizationErrorCode::ServerError,
                &request.state,
            ),
        }
    }
}

/// Validates the request against the resolved application.
fn validate_policy(
    application: &Application,
    request: &AuthorizationRequest,
) -> Result<(), AuthError> {
    if request.response_type != "code" {
        return Err(AuthError::invalid_request(format!(
            "Unsupported response_type: {}",
            request.response_type
        )));
    }

    if !application.is_redirect_uri_allowed(&request.redirect_uri) {
        return Err(AuthError::invalid_request(
            "redirect_uri is not registered for this application",
        ));
    }

    PkceChallenge::validate(&request.code_challenge, request.code_challenge_method)?;
    validate_scopes(application, &request.scopes)?;

    Ok(())
}

/// Builds an error redirect; falls back to a terminal rejection when the
/// target cannot be parsed.
fn error_redirect(target: &str, code: AuthorizationErrorCode, state: &str) -> AuthorizeOutcome {
    let error = AuthorizationError::new(code, state.to_string());
    match error.to_redirect_url(target) {
        Ok(url) => AuthorizeOutcome::Redirect { url },
        Err(_) => AuthorizeOutcome::Rejected {
            error: AuthError::internal("Cannot build error redirect URL"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use time::OffsetDateTime;
    use url::Url;
    use uuid::Uuid;

    use crate::storage::ConsentStorage;
    use crate::types::ConsentGrant;

    const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    // -------------------------------------------------------------------------
    // Mocks
    // -------------------------------------------------------------------------

    struct MockClients {
        applications: HashMap<String, Application>,
    }

    #[async_trait]
    impl ClientStorage for MockClients {
        async fn find_by_client_id(
            &self,
            client_id: &str,
        ) -> Result<Option<Application>, AuthError> {
            Ok(self.applications.get(client_id).cloned())
        }
    }

    #[derive(Default)]
    struct MockCodes {
        stored: RwLock<Vec<AuthorizationCode>>,
        fail: bool,
    }

    #[async_trait]
    impl AuthorizationCodeStorage for MockCodes {
        async fn create(&self, code: AuthorizationCode) -> Result<(), AuthError> {
            if self.fail {
                return Err(AuthError::storage("write failed"));
            }
            self.stored.write().unwrap().push(code);
            Ok(())
        }

        async fn consume(&self, code: &str) -> Result<AuthorizationCode, AuthError> {
            let mut stored = self.stored.write().unwrap();
            let found = stored
                .iter_mut()
                .find(|c| c.code == code && c.is_valid())
                .ok_or_else(|| AuthError::invalid_request("Unknown or used code"))?;
            found.consumed_at = Some(OffsetDateTime::now_utc());
            Ok(found.clone())
        }
    }

    #[derive(Default)]
    struct MockConsentStorage {
        grants: RwLock<Vec<ConsentGrant>>,
    }

    #[async_trait]
    impl ConsentStorage for MockConsentStorage {
        async fn find_latest(
            &self,
            user_id: &str,
            application_id: Uuid,
        ) -> Result<Option<ConsentGrant>, AuthError> {
            Ok(self
                .grants
                .read()
                .unwrap()
                .iter()
                .filter(|g| g.user_id == user_id && g.application_id == application_id)
                .filter(|g| !g.is_expired())
                .max_by_key(|g| g.created_at)
                .cloned())
        }

        async fn insert(&self, grant: ConsentGrant) -> Result<(), AuthError> {
            self.grants.write().unwrap().push(grant);
            Ok(())
        }
    }

    struct MockSessions {
        tokens: HashMap<String, String>,
    }

    #[async_trait]
    impl SessionProvider for MockSessions {
        async fn resolve(&self, token: &str) -> Result<Option<UserSession>, AuthError> {
            Ok(self.tokens.get(token).map(|user_id| UserSession {
                user_id: user_id.clone(),
                token: token.to_string(),
            }))
        }

        async fn issue_cookie(
            &self,
            session: &UserSession,
            remember: bool,
        ) -> Result<SessionCookie, AuthError> {
            Ok(SessionCookie {
                name: "idp_session".to_string(),
                value: session.token.clone(),
                max_age: remember.then(|| std::time::Duration::from_secs(30 * 24 * 3600)),
            })
        }
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    fn test_application() -> Application {
        let now = OffsetDateTime::now_utc();
        Application {
            id: Uuid::new_v4(),
            name: "Test App".to_string(),
            client_id: "test-client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uris: vec!["https://app.example.com/callback".to_string()],
            allowed_scopes: vec!["openid".to_string(), "profile".to_string()],
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    struct Setup {
        service: AuthorizationService,
        codes: Arc<MockCodes>,
        consent_storage: Arc<MockConsentStorage>,
        application: Application,
    }

    fn setup_with(application: Application, config: IdpConfig, failing_codes: bool) -> Setup {
        let clients = Arc::new(MockClients {
            applications: HashMap::from([(application.client_id.clone(), application.clone())]),
        });
        let codes = Arc::new(MockCodes {
            stored: RwLock::new(Vec::new()),
            fail: failing_codes,
        });
        let consent_storage = Arc::new(MockConsentStorage::default());
        let sessions = Arc::new(MockSessions {
            tokens: HashMap::from([("token-1".to_string(), "user-1".to_string())]),
        });
        let consent = ConsentManager::new(consent_storage.clone(), config.consent_lifetime);
        let service = AuthorizationService::new(
            clients,
            codes.clone(),
            consent,
            sessions,
            config,
        );
        Setup {
            service,
            codes,
            consent_storage,
            application,
        }
    }

    fn setup() -> Setup {
        setup_with(test_application(), IdpConfig::default(), false)
    }

    fn valid_params() -> AuthorizeParams {
        AuthorizeParams {
            response_type: Some("code".to_string()),
            client_id: Some("test-client".to_string()),
            redirect_uri: Some("https://app.example.com/callback".to_string()),
            scope: Some("openid profile".to_string()),
            state: Some("state-1".to_string()),
            code_challenge: Some(CHALLENGE.to_string()),
            code_challenge_method: Some("S256".to_string()),
            error_redirect_uri: None,
            consent: None,
            dont_remember_me: None,
        }
    }

    fn query_map(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Happy path
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_authorize_finalizes_with_code_and_state() {
        let setup = setup();
        let outcome = setup
            .service
            .authorize(&valid_params(), Some("token-1"))
            .await;

        let AuthorizeOutcome::Finalized {
            url,
            session_cookie,
        } = outcome
        else {
            panic!("expected Finalized, got {outcome:?}");
        };

        assert!(url.starts_with("https://app.example.com/callback?"));
        let query = query_map(&url);
        assert_eq!(query["state"], "state-1");
        assert_eq!(query["code"].len(), 43);

        // The code that went out is the code that was stored
        let stored = setup.codes.stored.read().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].code, query["code"]);
        assert_eq!(stored[0].user_id, "user-1");
        assert_eq!(stored[0].application_id, setup.application.id);
        assert_eq!(stored[0].scopes, vec!["openid", "profile"]);
        assert_eq!(stored[0].code_challenge, CHALLENGE);

        // Persistent cookie by default
        assert!(session_cookie.max_age.is_some());
    }

    #[tokio::test]
    async fn test_dont_remember_me_issues_session_scoped_cookie() {
        let setup = setup();
        let mut params = valid_params();
        params.dont_remember_me = Some("true".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Finalized { session_cookie, .. } = outcome else {
            panic!("expected Finalized, got {outcome:?}");
        };
        assert!(session_cookie.max_age.is_none());
    }

    // -------------------------------------------------------------------------
    // Parameter validation failures
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_missing_parameter_redirects_with_invalid_request() {
        let setup = setup();
        let mut params = valid_params();
        params.code_challenge = None;

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert!(url.starts_with("https://app.example.com/callback?"));
        let query = query_map(&url);
        assert_eq!(query["error"], "invalid_request");
        assert_eq!(query["state"], "state-1");
    }

    #[tokio::test]
    async fn test_missing_state_is_echoed_empty() {
        let setup = setup();
        let mut params = valid_params();
        params.state = None;

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        let query = query_map(&url);
        assert_eq!(query["error"], "invalid_request");
        assert_eq!(query["state"], "");
    }

    #[tokio::test]
    async fn test_no_redirect_target_is_terminal() {
        let setup = setup();
        let params = AuthorizeParams {
            client_id: Some("test-client".to_string()),
            ..Default::default()
        };

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Rejected { error } = outcome else {
            panic!("expected Rejected, got {outcome:?}");
        };
        assert!(matches!(error, AuthError::InvalidRequest { .. }));
    }

    // -------------------------------------------------------------------------
    // Client resolution
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_unknown_client_never_redirects() {
        let setup = setup();
        let mut params = valid_params();
        params.client_id = Some("ghost-client".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Rejected { error } = outcome else {
            panic!("expected Rejected, got {outcome:?}");
        };
        assert!(matches!(error, AuthError::InvalidClient { .. }));
    }

    #[tokio::test]
    async fn test_inactive_client_never_redirects() {
        let mut application = test_application();
        application.active = false;
        let setup = setup_with(application, IdpConfig::default(), false);

        let outcome = setup
            .service
            .authorize(&valid_params(), Some("token-1"))
            .await;
        assert!(matches!(
            outcome,
            AuthorizeOutcome::Rejected {
                error: AuthError::InvalidClient { .. }
            }
        ));
    }

    // -------------------------------------------------------------------------
    // Policy validation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_unregistered_redirect_uri_reports_invalid_request() {
        let setup = setup();
        let mut params = valid_params();
        params.redirect_uri = Some("https://evil.example.com/callback".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert_eq!(query_map(&url)["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_unsupported_response_type_reports_invalid_request() {
        let setup = setup();
        let mut params = valid_params();
        params.response_type = Some("token".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert_eq!(query_map(&url)["error"], "invalid_request");
    }

    #[tokio::test]
    async fn test_unknown_scope_reports_invalid_scope() {
        let setup = setup();
        let mut params = valid_params();
        params.scope = Some("openid hacker_scope".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        let query = query_map(&url);
        assert_eq!(query["error"], "invalid_scope");
        assert_eq!(query["state"], "state-1");
    }

    #[tokio::test]
    async fn test_ungranted_scope_reports_unauthorized_scope() {
        let setup = setup();
        let mut params = valid_params();
        params.scope = Some("openid email".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert_eq!(query_map(&url)["error"], "unauthorized_scope");
    }

    #[tokio::test]
    async fn test_error_redirect_uri_is_preferred_for_errors() {
        let setup = setup();
        let mut params = valid_params();
        params.error_redirect_uri = Some("https://app.example.com/oops".to_string());
        params.scope = Some("openid email".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert!(url.starts_with("https://app.example.com/oops?"));
    }

    #[tokio::test]
    async fn test_malformed_challenge_reports_invalid_request() {
        let setup = setup();
        let mut params = valid_params();
        params.code_challenge = Some("too-short".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert_eq!(query_map(&url)["error"], "invalid_request");
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_no_session_redirects_to_sign_in() {
        let setup = setup();
        let outcome = setup.service.authorize(&valid_params(), None).await;

        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert!(url.starts_with("http://localhost:8080/sign-in?"));
        let query = query_map(&url);
        // The original request travels along so sign-in can re-drive it
        assert_eq!(query["client_id"], "test-client");
        assert_eq!(query["state"], "state-1");
        assert_eq!(query["code_challenge"], CHALLENGE);
        assert_eq!(query["callback_url"], "http://localhost:8080/authorize");
    }

    #[tokio::test]
    async fn test_stale_token_redirects_to_sign_in() {
        let setup = setup();
        let outcome = setup
            .service
            .authorize(&valid_params(), Some("expired-token"))
            .await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert!(url.starts_with("http://localhost:8080/sign-in?"));
    }

    // -------------------------------------------------------------------------
    // Consent
    // -------------------------------------------------------------------------

    fn consent_config() -> IdpConfig {
        IdpConfig::default().with_consent_screen()
    }

    #[tokio::test]
    async fn test_consent_required_redirects_to_consent_page() {
        let setup = setup_with(test_application(), consent_config(), false);
        let outcome = setup
            .service
            .authorize(&valid_params(), Some("token-1"))
            .await;

        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        assert!(url.starts_with("http://localhost:8080/consent?"));
        let query = query_map(&url);
        assert_eq!(query["application_name"], "Test App");
        assert_eq!(query["callback_url"], "http://localhost:8080/authorize");
        assert_eq!(query["scope"], "openid profile");
    }

    #[tokio::test]
    async fn test_existing_grant_skips_consent_page() {
        let setup = setup_with(test_application(), consent_config(), false);
        setup
            .consent_storage
            .insert(ConsentGrant::new(
                "user-1",
                setup.application.id,
                vec!["openid".to_string(), "profile".to_string()],
                Duration::days(30),
            ))
            .await
            .unwrap();

        let outcome = setup
            .service
            .authorize(&valid_params(), Some("token-1"))
            .await;
        assert!(matches!(outcome, AuthorizeOutcome::Finalized { .. }));
    }

    #[tokio::test]
    async fn test_consent_granted_records_and_finalizes() {
        let setup = setup_with(test_application(), consent_config(), false);
        let mut params = valid_params();
        params.consent = Some("granted".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        assert!(matches!(outcome, AuthorizeOutcome::Finalized { .. }));

        let grants = setup.consent_storage.grants.read().unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].user_id, "user-1");
        assert_eq!(grants[0].scopes, vec!["openid", "profile"]);
    }

    #[tokio::test]
    async fn test_consent_declined_redirects_with_error() {
        let setup = setup_with(test_application(), consent_config(), false);
        let mut params = valid_params();
        params.consent = Some("decline".to_string());

        let outcome = setup.service.authorize(&params, Some("token-1")).await;
        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        let query = query_map(&url);
        assert_eq!(query["error"], "consent_declined");
        assert_eq!(query["state"], "state-1");

        // Declining never stores anything
        assert!(setup.consent_storage.grants.read().unwrap().is_empty());
        assert!(setup.codes.stored.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skip_consent_ignores_consent_machinery() {
        let setup = setup();
        let outcome = setup
            .service
            .authorize(&valid_params(), Some("token-1"))
            .await;
        assert!(matches!(outcome, AuthorizeOutcome::Finalized { .. }));
        assert!(setup.consent_storage.grants.read().unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // Failures during finalization
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_code_store_failure_reports_server_error() {
        let setup = setup_with(test_application(), IdpConfig::default(), true);
        let outcome = setup
            .service
            .authorize(&valid_params(), Some("token-1"))
            .await;

        let AuthorizeOutcome::Redirect { url } = outcome else {
            panic!("expected Redirect, got {outcome:?}");
        };
        let query = query_map(&url);
        assert_eq!(query["error"], "server_error");
        assert_eq!(query["state"], "state-1");
    }

    // -------------------------------------------------------------------------
    // Code consumption (token-exchange side of the storage contract)
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_issued_code_is_single_use() {
        let setup = setup();
        let outcome = setup
            .service
            .authorize(&valid_params(), Some("token-1"))
            .await;
        let AuthorizeOutcome::Finalized { url, .. } = outcome else {
            panic!("expected Finalized, got {outcome:?}");
        };
        let code = query_map(&url)["code"].clone();

        let consumed = setup.codes.consume(&code).await.unwrap();
        assert_eq!(consumed.user_id, "user-1");
        assert!(consumed.is_consumed());

        // Second redemption fails
        assert!(setup.codes.consume(&code).await.is_err());
    }
}
