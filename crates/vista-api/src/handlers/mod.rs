//! Request handlers organized by resource.

pub mod embed;
pub mod health;
