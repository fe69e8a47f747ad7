//! OAuth 2.0 authorization flow.

pub mod authorize;
pub mod code;
pub mod consent;
pub mod pkce;
pub mod scopes;
pub mod service;

pub use authorize::{
    AuthorizationError, AuthorizationRequest, AuthorizationResponse, AuthorizeParams,
    ConsentDecision,
};
pub use code::AuthorizationCode;
pub use consent::ConsentManager;
pub use pkce::{PkceChallenge, PkceChallengeMethod, PkceVerifier};
pub use service::{AuthorizationService, AuthorizeOutcome};
