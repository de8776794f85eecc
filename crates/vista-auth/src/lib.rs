//! Service-principal token acquisition for Vista.
//!
//! This crate performs the first trust hop of every embed call: it exchanges
//! the static service-principal credentials for a short-lived bearer token
//! using the OAuth2 client-credentials grant.

pub mod azure;
pub mod provider;

pub use azure::AadTokenProvider;
pub use provider::{BearerToken, StaticTokenProvider, TokenCache, TokenProvider};
