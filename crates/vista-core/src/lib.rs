//! Vista Core
//!
//! Shared vocabulary for the embed-credential pipeline: resource identifiers,
//! the report/embed model, the error taxonomy, static configuration and the
//! per-call context. Every other crate depends on this one.

pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod model;
pub mod widget;

pub use context::CallContext;
pub use error::{Error, Result};
pub use ids::*;
