//! Embed-credential orchestration for Vista.
//!
//! [`EmbedService`] performs the second trust hop: with a bearer token from
//! `vista-auth` it looks reports up in the BI service, classifies them, picks
//! the matching [`TokenRequest`] shape and asks the BI service for a scoped
//! embed token.

pub mod client;
pub mod request;
pub mod service;

pub use client::PowerBiClient;
pub use request::{GenerateTokenRequest, GenerateTokenRequestV2, TokenRequest, TokenRequestBody};
pub use service::EmbedService;
