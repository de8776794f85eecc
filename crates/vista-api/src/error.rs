//! Mapping from embed errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;
use vista_core::Error;

/// Error returned by API handlers.
#[derive(Debug)]
pub struct ApiError(pub Error);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::AuthFailure(_) | Error::TokenGenerationFailure(_) => StatusCode::BAD_GATEWAY,
            Error::ReportNotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(%status, error = %self.0, "Embed request failed");
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::AuthFailure("x".into()), StatusCode::BAD_GATEWAY),
            (
                Error::ReportNotFound {
                    workspace_id: Uuid::new_v4().into(),
                    report_id: Uuid::new_v4().into(),
                    reason: "HTTP 404".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (Error::TokenGenerationFailure("x".into()), StatusCode::BAD_GATEWAY),
            (Error::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (Error::Timeout(Duration::from_secs(30)), StatusCode::GATEWAY_TIMEOUT),
            (Error::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
            (Error::InvalidConfig("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
