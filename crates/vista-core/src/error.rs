//! Error types for Vista.
//!
//! Messages carried by these variants are shown to callers and written to
//! logs, so they never contain client secrets, bearer tokens or embed tokens.

use crate::ids::{ReportId, WorkspaceId};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Identity provider
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    // BI service
    #[error("Report {report_id} not found in workspace {workspace_id}: {reason}")]
    ReportNotFound {
        workspace_id: WorkspaceId,
        report_id: ReportId,
        reason: String,
    },

    #[error("Embed token generation failed: {0}")]
    TokenGenerationFailure(String),

    // Caller
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Call cancelled")]
    Cancelled,

    // Static configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable kind, used in API error bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AuthFailure(_) => "auth_failure",
            Error::ReportNotFound { .. } => "report_not_found",
            Error::TokenGenerationFailure(_) => "token_generation_failure",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Timeout(_) => "timeout",
            Error::Cancelled => "cancelled",
            Error::InvalidConfig(_) => "invalid_config",
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_report_not_found_display() {
        let workspace_id = WorkspaceId::from_uuid(Uuid::new_v4());
        let report_id = ReportId::from_uuid(Uuid::new_v4());
        let err = Error::ReportNotFound {
            workspace_id,
            report_id,
            reason: "HTTP 404".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains(&report_id.to_string()));
        assert!(msg.contains(&workspace_id.to_string()));
        assert_eq!(err.kind(), "report_not_found");
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            Error::AuthFailure(String::new()).kind(),
            Error::TokenGenerationFailure(String::new()).kind(),
            Error::InvalidRequest(String::new()).kind(),
            Error::Timeout(Duration::from_secs(1)).kind(),
            Error::Cancelled.kind(),
            Error::InvalidConfig(String::new()).kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
