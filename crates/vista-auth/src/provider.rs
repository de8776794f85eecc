//! Bearer tokens, the provider trait and the opt-in token cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use vista_core::config::TokenCachePolicy;
use vista_core::{CallContext, Result};

/// Short-lived bearer token from the identity provider.
#[derive(Clone)]
pub struct BearerToken {
    pub token_type: String,
    access_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl BearerToken {
    pub fn new(token_type: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            token_type: token_type.into(),
            access_token: SecretString::from(access_token.into()),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.expose_secret().is_empty()
    }

    /// `true` while the token is still valid `skew` from now.
    pub fn is_fresh(&self, skew: Duration) -> bool {
        match (self.expires_at, chrono::Duration::from_std(skew)) {
            (Some(expires_at), Ok(skew)) => Utc::now() + skew < expires_at,
            _ => false,
        }
    }
}

/// Source of bearer tokens for the BI service.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Acquire a token, honouring the call's deadline and cancellation.
    async fn access_token(&self, ctx: &CallContext) -> Result<BearerToken>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Holds the last minted token when the policy allows reuse.
pub struct TokenCache {
    policy: TokenCachePolicy,
    slot: Mutex<Option<BearerToken>>,
}

impl TokenCache {
    pub fn new(policy: TokenCachePolicy) -> Self {
        Self {
            policy,
            slot: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> TokenCachePolicy {
        self.policy
    }

    /// Return a cached token if it is still fresh, otherwise run `mint`.
    ///
    /// With [`TokenCachePolicy::Disabled`] this always runs `mint` and stores
    /// nothing. Tokens without an expiry are never stored. Waiting for the
    /// slot while another caller mints counts against `ctx`.
    pub async fn get_or_mint<F, Fut>(&self, ctx: &CallContext, mint: F) -> Result<BearerToken>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<BearerToken>> + Send,
    {
        let refresh_skew = match self.policy {
            TokenCachePolicy::Disabled => return mint().await,
            TokenCachePolicy::ExpiryAware { refresh_skew } => refresh_skew,
        };

        let mut slot = ctx.run(async { Ok(self.slot.lock().await) }).await?;
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh(refresh_skew)) {
            debug!(expires_at = ?token.expires_at, "Reusing cached service-principal token");
            return Ok(token.clone());
        }

        let token = mint().await?;
        *slot = token.expires_at.is_some().then(|| token.clone());
        Ok(token)
    }

    /// Drop any cached token.
    pub async fn clear(&self) {
        self.slot.lock().await.take();
    }
}

/// Provider returning a fixed token. Useful for tests and for pre-issued tokens.
pub struct StaticTokenProvider {
    token: BearerToken,
}

impl StaticTokenProvider {
    pub fn new(token: BearerToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self, ctx: &CallContext) -> Result<BearerToken> {
        let token = self.token.clone();
        ctx.run(async move { Ok(token) }).await
    }

    fn name(&self) -> &str {
        "static"
    }
}
