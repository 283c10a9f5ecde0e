//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, highest precedence first:
//!
//! 1. Environment variables (M365_*)
//! 2. Unprefixed app registration variables (CLIENT_ID, CLIENT_SECRET,
//!    TENANT_ID, REGION) and their DELEGATED_* counterparts
//! 3. TOML config file (if M365_CONFIG_FILE set)
//! 4. Built-in defaults

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod region;
mod validation;

pub use region::{Region, UnknownRegion};
pub use validation::ConfigError;

/// App registration used for client-credential and code-exchange requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

/// App registration plus redirect URI for the delegated sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedApp {
    pub credentials: ClientCredentials,
    pub redirect_uri: String,
}

/// Settings for the delegated (user sign-in) flow.
///
/// Set via DELEGATED_CLIENT_ID, DELEGATED_CLIENT_SECRET, DELEGATED_TENANT_ID
/// and DELEGATED_REDIRECT_URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegatedConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

impl Default for DelegatedConfig {
    fn default() -> Self {
        Self { client_id: None, client_secret: None, tenant_id: None, redirect_uri: default_redirect_uri() }
    }
}

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application (client) id of the app registration.
    ///
    /// Set via CLIENT_ID or M365_CLIENT_ID.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret of the app registration.
    ///
    /// Set via CLIENT_SECRET or M365_CLIENT_SECRET.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Directory (tenant) id.
    ///
    /// Set via TENANT_ID or M365_TENANT_ID.
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Search region (NAM, EUR, APC, AUS, IND, CAN). Unknown values fall back to NAM.
    ///
    /// Set via REGION or M365_REGION.
    #[serde(default = "default_region")]
    pub region: String,

    /// Delegated sign-in settings.
    #[serde(default)]
    pub delegated: DelegatedConfig,

    /// Graph REST base URL.
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,

    /// OAuth2 authority base URL (tenant id is appended).
    #[serde(default = "default_authority_base_url")]
    pub authority_base_url: String,

    /// Root of the download cache tree.
    ///
    /// Set via M365_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Path to SQLite search cache database.
    ///
    /// Set via M365_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Age after which downloaded files and extracted text are stale.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Lifetime of cached Graph search responses.
    #[serde(default = "default_search_cache_ttl_secs")]
    pub search_cache_ttl_secs: u64,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via M365_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to download per file.
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Listen address of the HTTP API.
    ///
    /// Set via M365_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Friendly site names mapped to Graph site ids.
    ///
    /// Set via M365_SITE_ALIASES__<NAME>=<site id> or the TOML file.
    #[serde(default)]
    pub site_aliases: BTreeMap<String, String>,
}

fn default_region() -> String {
    Region::Nam.to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8000/auth/callback".into()
}

fn default_graph_base_url() -> String {
    "https://graph.microsoft.com/v1.0".into()
}

fn default_authority_base_url() -> String {
    "https://login.microsoftonline.com".into()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./.local/downloads")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./.local/m365-search-cache.sqlite")
}

fn default_cache_ttl_secs() -> u64 {
    24 * 3600
}

fn default_search_cache_ttl_secs() -> u64 {
    3600
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_download_bytes() -> u64 {
    52_428_800 // 50MB
}

fn default_user_agent() -> String {
    "m365-search/0.1".into()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            tenant_id: None,
            region: default_region(),
            delegated: DelegatedConfig::default(),
            graph_base_url: default_graph_base_url(),
            authority_base_url: default_authority_base_url(),
            cache_dir: default_cache_dir(),
            db_path: default_db_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            search_cache_ttl_secs: default_search_cache_ttl_secs(),
            timeout_ms: default_timeout_ms(),
            max_download_bytes: default_max_download_bytes(),
            user_agent: default_user_agent(),
            bind_addr: default_bind_addr(),
            site_aliases: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Download cache lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Search response cache lifetime.
    pub fn search_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.search_cache_ttl_secs)
    }

    /// Search region, with unknown values mapped to NAM.
    pub fn region(&self) -> Region {
        Region::parse_or_default(&self.region)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("M365_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment
            .merge(Env::raw().only(&["client_id", "client_secret", "tenant_id", "region"]))
            .merge(
                Env::prefixed("DELEGATED_")
                    .only(&["client_id", "client_secret", "tenant_id", "redirect_uri"])
                    .map(|key| format!("delegated.{}", key.as_str().to_lowercase()).into()),
            )
            .merge(
                Env::prefixed("M365_")
                    .ignore(&["config_file"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// App-only credentials, required by every Graph operation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent or empty value.
    pub fn require_credentials(&self) -> Result<ClientCredentials, ConfigError> {
        Ok(ClientCredentials {
            tenant_id: required(&self.tenant_id, "tenant_id", "Set TENANT_ID environment variable")?,
            client_id: required(&self.client_id, "client_id", "Set CLIENT_ID environment variable")?,
            client_secret: required(&self.client_secret, "client_secret", "Set CLIENT_SECRET environment variable")?,
        })
    }

    /// Delegated sign-in settings, required only by the /auth routes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent or empty value.
    pub fn require_delegated(&self) -> Result<DelegatedApp, ConfigError> {
        let d = &self.delegated;
        Ok(DelegatedApp {
            credentials: ClientCredentials {
                tenant_id: required(&d.tenant_id, "delegated.tenant_id", "Set DELEGATED_TENANT_ID environment variable")?,
                client_id: required(&d.client_id, "delegated.client_id", "Set DELEGATED_CLIENT_ID environment variable")?,
                client_secret: required(
                    &d.client_secret,
                    "delegated.client_secret",
                    "Set DELEGATED_CLIENT_SECRET environment variable",
                )?,
            },
            redirect_uri: d.redirect_uri.clone(),
        })
    }
}

fn required(value: &Option<String>, field: &str, hint: &str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::Missing { field: field.into(), hint: hint.into() })
}
