//! Static configuration.
//!
//! Loaded once at start-up and shared read-only (behind `Arc`) with the
//! identity provider client and the embed service. Sources, lowest priority
//! first: built-in defaults, an optional settings file, then `VISTA__*`
//! environment variables (`VISTA__AZURE_AD__CLIENT_SECRET` and so on).

use crate::error::{Error, Result};
use crate::ids::{ReportId, WorkspaceId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SETTINGS_FILE: &str = "vista";
pub const ENV_PREFIX: &str = "VISTA";
pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com/";
pub const DEFAULT_POWER_BI_API_URL: &str = "https://api.powerbi.com";
pub const DEFAULT_POWER_BI_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default";
pub const DEFAULT_RLS_ROLE: &str = "Role CurrUser";

/// Serde adapter for secrets: reads a plain string, always writes a placeholder.
mod redacted {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(_: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
        String::deserialize(deserializer).map(SecretString::from)
    }
}

/// Scope lists come as a YAML/JSON sequence from files and as one
/// space-separated string from the environment.
mod scope_list {
    use serde::de::{self, SeqAccess, Visitor};
    use serde::Deserializer;
    use std::fmt;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        struct ScopeList;

        impl<'de> Visitor<'de> for ScopeList {
            type Value = Vec<String>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of scopes or a space-separated string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(value.split_whitespace().map(str::to_string).collect())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut scopes = Vec::new();
                while let Some(scope) = seq.next_element::<String>()? {
                    scopes.push(scope);
                }
                Ok(scopes)
            }
        }

        deserializer.deserialize_any(ScopeList)
    }
}

/// Service-principal settings for the identity provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureAdConfig {
    pub tenant_id: String,
    pub client_id: String,
    /// Client secret. Redacted in `Debug` and in serialized output.
    #[serde(with = "redacted")]
    pub client_secret: SecretString,
    /// Scopes requested for the token; only the first is sent.
    #[serde(default = "default_scope_base", deserialize_with = "scope_list::deserialize")]
    pub scope_base: Vec<String>,
    #[serde(default = "default_authority_url")]
    pub authority_url: String,
}

fn default_scope_base() -> Vec<String> {
    vec![DEFAULT_POWER_BI_SCOPE.to_string()]
}

fn default_authority_url() -> String {
    DEFAULT_AUTHORITY_URL.to_string()
}

impl std::fmt::Debug for AzureAdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAdConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope_base", &self.scope_base)
            .field("authority_url", &self.authority_url)
            .finish()
    }
}

impl AzureAdConfig {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            scope_base: default_scope_base(),
            authority_url: default_authority_url(),
        }
    }

    /// Replace the requested scopes with a single scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope_base = vec![scope.into()];
        self
    }

    /// Point at a different authority, e.g. a sovereign cloud or a test double.
    #[must_use]
    pub fn with_authority_url(mut self, url: impl Into<String>) -> Self {
        self.authority_url = url.into();
        self
    }

    /// The scope sent with the client-credentials grant.
    pub fn scope(&self) -> Result<&str> {
        self.scope_base
            .first()
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("azure_ad.scope_base is empty".to_string()))
    }

    /// `{authority}{tenant}/oauth2/v2.0/token`
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(Error::InvalidConfig("azure_ad.tenant_id is required".to_string()));
        }
        if self.client_id.trim().is_empty() {
            return Err(Error::InvalidConfig("azure_ad.client_id is required".to_string()));
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(Error::InvalidConfig(
                "azure_ad.client_secret is required".to_string(),
            ));
        }
        self.scope()?;
        url::Url::parse(&self.authority_url)
            .map_err(|e| Error::InvalidConfig(format!("azure_ad.authority_url: {e}")))?;
        Ok(())
    }
}

/// BI-service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerBiConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Role name put on every RLS identity.
    #[serde(default = "default_rls_role")]
    pub rls_role: String,
    /// Workspace used when a caller does not name one (CLI only).
    #[serde(default)]
    pub default_workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub default_report_id: Option<ReportId>,
}

fn default_api_url() -> String {
    DEFAULT_POWER_BI_API_URL.to_string()
}

fn default_rls_role() -> String {
    DEFAULT_RLS_ROLE.to_string()
}

impl Default for PowerBiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            rls_role: default_rls_role(),
            default_workspace_id: None,
            default_report_id: None,
        }
    }
}

impl PowerBiConfig {
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    #[must_use]
    pub fn with_rls_role(mut self, role: impl Into<String>) -> Self {
        self.rls_role = role.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_url)
            .map_err(|e| Error::InvalidConfig(format!("power_bi.api_url: {e}")))?;
        if self.rls_role.trim().is_empty() {
            return Err(Error::InvalidConfig("power_bi.rls_role is empty".to_string()));
        }
        Ok(())
    }
}

/// Whether identity-provider tokens are reused between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCachePolicy {
    /// Mint a fresh token on every call.
    Disabled,
    /// Reuse a token until `refresh_skew` before it expires.
    ExpiryAware { refresh_skew: Duration },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_refresh_skew_secs")]
    pub refresh_skew_secs: u64,
}

fn default_refresh_skew_secs() -> u64 {
    300
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            refresh_skew_secs: default_refresh_skew_secs(),
        }
    }
}

impl TokenCacheConfig {
    pub fn policy(&self) -> TokenCachePolicy {
        if self.enabled {
            TokenCachePolicy::ExpiryAware {
                refresh_skew: Duration::from_secs(self.refresh_skew_secs),
            }
        } else {
            TokenCachePolicy::Disabled
        }
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Budget for one embed call, covering both network hops.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub azure_ad: AzureAdConfig,
    #[serde(default)]
    pub power_bi: PowerBiConfig,
    #[serde(default)]
    pub token_cache: TokenCacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Settings {
    pub fn new(azure_ad: AzureAdConfig) -> Self {
        Self {
            azure_ad,
            power_bi: PowerBiConfig::default(),
            token_cache: TokenCacheConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Load settings from `path` (or `vista.{yaml,json,toml}` in the working
    /// directory when `None`) layered under `VISTA__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings: Settings = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.azure_ad.validate()?;
        self.power_bi.validate()?;
        if self.server.request_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Environment values stay strings; typed fields are converted on
/// deserialization, so all-digit secrets and ids keep their leading zeros.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn azure_ad() -> AzureAdConfig {
        AzureAdConfig::new("tid-123", "cid-456", "super-private")
    }

    #[test]
    fn test_token_endpoint() {
        let config = azure_ad();
        assert_eq!(
            config.token_endpoint(),
            "https://login.microsoftonline.com/tid-123/oauth2/v2.0/token"
        );

        let config = azure_ad().with_authority_url("http://127.0.0.1:9000");
        assert_eq!(
            config.token_endpoint(),
            "http://127.0.0.1:9000/tid-123/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", Settings::new(azure_ad()));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-private"));
    }

    #[test]
    fn test_serialize_redacts_secret() {
        let yaml = serde_json::to_string(&Settings::new(azure_ad())).unwrap();
        assert!(yaml.contains("[REDACTED]"));
        assert!(!yaml.contains("super-private"));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(AzureAdConfig::new("", "cid", "secret").validate().is_err());
        assert!(AzureAdConfig::new("tid", "", "secret").validate().is_err());
        assert!(AzureAdConfig::new("tid", "cid", "").validate().is_err());

        let mut config = azure_ad();
        config.scope_base.clear();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        assert!(azure_ad().validate().is_ok());
    }

    #[test]
    fn test_cache_policy() {
        assert_eq!(TokenCacheConfig::default().policy(), TokenCachePolicy::Disabled);

        let config = TokenCacheConfig {
            enabled: true,
            refresh_skew_secs: 60,
        };
        assert_eq!(
            config.policy(),
            TokenCachePolicy::ExpiryAware {
                refresh_skew: Duration::from_secs(60)
            }
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
azure_ad:
  tenant_id: tid-file
  client_id: cid-file
  client_secret: secret-file
power_bi:
  rls_role: Viewer
token_cache:
  enabled: true
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.azure_ad.tenant_id, "tid-file");
        assert_eq!(settings.azure_ad.client_secret.expose_secret(), "secret-file");
        assert_eq!(settings.azure_ad.scope().unwrap(), DEFAULT_POWER_BI_SCOPE);
        assert_eq!(settings.power_bi.rls_role, "Viewer");
        assert_eq!(settings.power_bi.api_url, DEFAULT_POWER_BI_API_URL);
        assert!(matches!(
            settings.token_cache.policy(),
            TokenCachePolicy::ExpiryAware { .. }
        ));
        assert_eq!(settings.server.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_missing_required_file() {
        let result = Settings::load(Some(Path::new("/nonexistent/vista.yaml")));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn test_env_values_are_not_reparsed() {
        let settings = Settings::load_with_env(
            None,
            env(&[
                ("VISTA__AZURE_AD__TENANT_ID", "0042"),
                ("VISTA__AZURE_AD__CLIENT_ID", "007"),
                ("VISTA__AZURE_AD__CLIENT_SECRET", "0123"),
                ("VISTA__AZURE_AD__SCOPE_BASE", "api://vista/.default offline_access"),
                ("VISTA__TOKEN_CACHE__ENABLED", "true"),
                ("VISTA__TOKEN_CACHE__REFRESH_SKEW_SECS", "120"),
                ("VISTA__SERVER__REQUEST_TIMEOUT_SECS", "15"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.azure_ad.tenant_id, "0042");
        assert_eq!(settings.azure_ad.client_id, "007");
        assert_eq!(settings.azure_ad.client_secret.expose_secret(), "0123");
        assert_eq!(
            settings.azure_ad.scope_base,
            vec!["api://vista/.default".to_string(), "offline_access".to_string()]
        );
        assert_eq!(
            settings.token_cache.policy(),
            TokenCachePolicy::ExpiryAware {
                refresh_skew: Duration::from_secs(120)
            }
        );
        assert_eq!(settings.server.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
azure_ad:
  tenant_id: tid-file
  client_id: cid-file
  client_secret: secret-file
  scope_base: ["api://file/.default"]
"#
        )
        .unwrap();

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("VISTA__AZURE_AD__CLIENT_SECRET", "000999")]),
        )
        .unwrap();
        assert_eq!(settings.azure_ad.tenant_id, "tid-file");
        assert_eq!(settings.azure_ad.scope().unwrap(), "api://file/.default");
        assert_eq!(settings.azure_ad.client_secret.expose_secret(), "000999");
    }
}
