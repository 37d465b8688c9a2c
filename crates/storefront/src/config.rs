//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHOPFRONT_API_BASE_URL` - Backend REST base URL (default: `http://localhost:8080/api`)
//! - `SHOPFRONT_SESSION_DIR` - Directory for the persisted session (default: in-memory only)
//! - `SHOPFRONT_CATALOG_PAGE_SIZE` - Products per catalog page (default: 12, max 100)
//! - `SHOPFRONT_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SHOPFRONT_CATALOG_CACHE_TTL_SECS` - Catalog page cache TTL, 0 disables (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_PAGE_SIZE: u32 = 12;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 60;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is appended to (no trailing slash)
    pub api_base_url: Url,
    /// Directory holding the persisted session, if any
    pub session_dir: Option<PathBuf>,
    /// Products requested per catalog page
    pub catalog_page_size: u32,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// How long catalog pages stay cached; zero disables the cache
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration for `api_base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not http(s).
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("SHOPFRONT_API_BASE_URL", api_base_url)?,
            session_dir: None,
            catalog_page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base = get_env_or_default("SHOPFRONT_API_BASE_URL", DEFAULT_API_BASE_URL);
        let mut config = Self::new(&base)?;

        config.session_dir = get_optional_env("SHOPFRONT_SESSION_DIR").map(PathBuf::from);
        config.catalog_page_size = parse_page_size(&get_env_or_default(
            "SHOPFRONT_CATALOG_PAGE_SIZE",
            &DEFAULT_PAGE_SIZE.to_string(),
        ))?;

        let timeout = parse_u64(
            "SHOPFRONT_REQUEST_TIMEOUT_SECS",
            &get_env_or_default(
                "SHOPFRONT_REQUEST_TIMEOUT_SECS",
                &DEFAULT_TIMEOUT_SECS.to_string(),
            ),
        )?;
        if timeout == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPFRONT_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        config.request_timeout = Duration::from_secs(timeout);

        config.catalog_cache_ttl = Duration::from_secs(parse_u64(
            "SHOPFRONT_CATALOG_CACHE_TTL_SECS",
            &get_env_or_default(
                "SHOPFRONT_CATALOG_CACHE_TTL_SECS",
                &DEFAULT_CATALOG_CACHE_TTL_SECS.to_string(),
            ),
        )?);

        config.sentry_dsn = get_optional_env("SENTRY_DSN");
        config.sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(config)
    }

    /// Absolute URL for an API path such as `/cart/items/7`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_page_size(value: &str) -> Result<u32, ConfigError> {
    let key = "SHOPFRONT_CATALOG_PAGE_SIZE";
    let size = value
        .trim()
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 1 and {MAX_PAGE_SIZE}"),
        ));
    }
    Ok(size)
}
