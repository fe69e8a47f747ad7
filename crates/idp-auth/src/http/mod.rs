//! HTTP transport layer.

pub mod authorize;

pub use authorize::{AuthorizeState, authorize_get, router};
