//! Storage abstractions.
//!
//! The authorization service is storage-agnostic: every persistent record
//! it touches sits behind an async trait object supplied at construction.
//! Backends implement these traits over whatever store they use.

pub mod client;
pub mod code;
pub mod consent;

pub use client::ClientStorage;
pub use code::AuthorizationCodeStorage;
pub use consent::ConsentStorage;
