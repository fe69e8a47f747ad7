//! Domain types for the authorization endpoint.

pub mod application;
pub mod consent;

pub use application::{Application, ApplicationValidationError};
pub use consent::ConsentGrant;
