//! Cloud API client and its identity provider.

pub mod client;
pub mod identity;
pub mod session;

pub use client::{CloudClient, DEFAULT_CLIENT_VERSION, DEFAULT_TIMELINE_INTERVAL_DAYS};
pub use identity::{CognitoIdentityProvider, IdentityProvider, Tokens};
pub use session::Session;
