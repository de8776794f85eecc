//! Power BI REST client.
//!
//! A `PowerBiClient` carries one bearer token and is built per call; it is
//! never reused across calls. The underlying `reqwest::Client` (and its
//! connection pool) is shared.

use crate::request::{GenerateTokenRequest, GenerateTokenRequestV2};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, warn};
use vista_auth::BearerToken;
use vista_core::model::{EmbedToken, ReportDescriptor};
use vista_core::{Error, ReportId, Result, WorkspaceId};

pub struct PowerBiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: BearerToken,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: String,
}

impl PowerBiClient {
    pub fn new(http: reqwest::Client, base_url: &str, bearer: BearerToken) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/v1.0/myorg{}", self.base_url, path);
        self.http
            .request(method, url)
            .bearer_auth(self.bearer.access_token().expose_secret())
    }

    /// Look a report up in a workspace.
    pub async fn get_report(
        &self,
        workspace_id: WorkspaceId,
        report_id: ReportId,
    ) -> Result<ReportDescriptor> {
        debug!(%workspace_id, %report_id, "Fetching report");

        let not_found = |reason: String| Error::ReportNotFound {
            workspace_id,
            report_id,
            reason,
        };

        let res = self
            .request(
                Method::GET,
                &format!("/groups/{workspace_id}/reports/{report_id}"),
            )
            .send()
            .await
            .map_err(|e| not_found(format!("request failed: {}", e.without_url())))?;

        let res = check_status(res).await.map_err(not_found)?;
        res.json()
            .await
            .map_err(|e| not_found(format!("unreadable report metadata: {}", e.without_url())))
    }

    /// Multi-resource token: `POST /GenerateToken`.
    pub async fn generate_token(&self, body: &GenerateTokenRequestV2) -> Result<EmbedToken> {
        let res = self
            .request(Method::POST, "/GenerateToken")
            .json(body)
            .send()
            .await
            .map_err(generation_failed)?;

        read_token(res).await
    }

    /// Access-level token for a single report: `POST /groups/{ws}/reports/{id}/GenerateToken`.
    pub async fn generate_token_in_group(
        &self,
        workspace_id: WorkspaceId,
        report_id: ReportId,
        body: &GenerateTokenRequest,
    ) -> Result<EmbedToken> {
        let res = self
            .request(
                Method::POST,
                &format!("/groups/{workspace_id}/reports/{report_id}/GenerateToken"),
            )
            .json(body)
            .send()
            .await
            .map_err(generation_failed)?;

        read_token(res).await
    }
}

fn generation_failed(err: reqwest::Error) -> Error {
    Error::TokenGenerationFailure(format!("request failed: {}", err.without_url()))
}

async fn read_token(res: Response) -> Result<EmbedToken> {
    let res = check_status(res)
        .await
        .map_err(Error::TokenGenerationFailure)?;
    res.json()
        .await
        .map_err(|e| Error::TokenGenerationFailure(format!("unreadable token response: {}", e.without_url())))
}

/// Pass 2xx responses through; otherwise describe the failure by status and
/// the service's error code, never by the raw body.
async fn check_status(res: Response) -> std::result::Result<Response, String> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let reason = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => format!("HTTP {status}: {}", parsed.error.code),
        Err(_) => format!("HTTP {status}"),
    };
    warn!(%status, %reason, "BI service request failed");
    Err(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = PowerBiClient::new(
            reqwest::Client::new(),
            "https://api.powerbi.com/",
            BearerToken::new("Bearer", "t"),
        );
        assert_eq!(client.base_url, "https://api.powerbi.com");
    }

    #[test]
    fn test_api_error_body() {
        let body = r#"{"error":{"code":"PowerBIEntityNotFound","pbi.error":{"code":"PowerBIEntityNotFound","parameters":{},"details":[]}}}"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.code, "PowerBIEntityNotFound");
    }
}
