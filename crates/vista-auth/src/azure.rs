//! Azure AD client-credentials token exchange.

use crate::provider::{BearerToken, TokenCache, TokenProvider};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vista_core::config::{AzureAdConfig, TokenCachePolicy};
use vista_core::{CallContext, Error, Result};

/// Service-principal token provider backed by the Azure AD v2.0 token endpoint.
pub struct AadTokenProvider {
    config: Arc<AzureAdConfig>,
    client: reqwest::Client,
    cache: TokenCache,
}

#[derive(Debug, Deserialize)]
struct AadTokenResponse {
    token_type: String,
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AadErrorResponse {
    error: String,
}

impl AadTokenProvider {
    /// Provider that mints a fresh token on every call.
    pub fn new(config: Arc<AzureAdConfig>, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            cache: TokenCache::new(TokenCachePolicy::Disabled),
        }
    }

    #[must_use]
    pub fn with_cache_policy(mut self, policy: TokenCachePolicy) -> Self {
        self.cache = TokenCache::new(policy);
        self
    }

    pub fn cache_policy(&self) -> TokenCachePolicy {
        self.cache.policy()
    }

    fn token_endpoint(&self) -> String {
        self.config.token_endpoint()
    }

    async fn exchange(&self) -> Result<BearerToken> {
        let scope = self.config.scope()?;

        debug!(
            tenant_id = %self.config.tenant_id,
            client_id = %self.config.client_id,
            "Requesting service-principal token"
        );

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("scope", scope),
        ];

        let response = self
            .client
            .post(self.token_endpoint())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::AuthFailure(format!("token request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<AadErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| "unknown_error".to_string());
            warn!(
                tenant_id = %self.config.tenant_id,
                %status,
                error = %code,
                "Identity provider rejected token request"
            );
            return Err(Error::AuthFailure(format!(
                "identity provider returned {status}: {code}"
            )));
        }

        let token: AadTokenResponse = response
            .json()
            .await
            .map_err(|_| Error::AuthFailure("unparsable token response".to_string()))?;

        if token.access_token.is_empty() {
            return Err(Error::AuthFailure(
                "token response carried an empty access token".to_string(),
            ));
        }

        info!(
            token_type = %token.token_type,
            expires_in = ?token.expires_in,
            "Acquired service-principal token"
        );

        let mut bearer = BearerToken::new(token.token_type, token.access_token);
        match token.expires_in.and_then(expiry_from_now) {
            Some(expires_at) => bearer = bearer.with_expires_at(expires_at),
            None if token.expires_in.is_some() => {
                warn!(expires_in = ?token.expires_in, "Ignoring out-of-range token lifetime");
            }
            None => {}
        }
        Ok(bearer)
    }
}

/// `None` for negative lifetimes or ones past the representable range; such
/// tokens carry no expiry and are never cached.
fn expiry_from_now(expires_in: i64) -> Option<DateTime<Utc>> {
    if expires_in < 0 {
        return None;
    }
    Duration::try_seconds(expires_in).and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
}

#[async_trait]
impl TokenProvider for AadTokenProvider {
    async fn access_token(&self, ctx: &CallContext) -> Result<BearerToken> {
        self.cache
            .get_or_mint(ctx, || ctx.run(self.exchange()))
            .await
    }

    fn name(&self) -> &str {
        "azure_ad"
    }
}
