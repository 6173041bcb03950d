//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PICKNGO_API_BASE_URL` - Backend REST API root (default: `http://localhost:1337/api`)
//! - `PICKNGO_API_TOKEN` - Bearer token sent with every request
//! - `PICKNGO_FETCH_LIMIT` - Maximum cart rows fetched per load (default: 1000)
//! - `PICKNGO_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `PICKNGO_CURRENCY` - ISO 4217 code used for display (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use pickngo_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:1337/api";
const DEFAULT_FETCH_LIMIT: u32 = 1000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart client configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct CartConfig {
    /// Backend REST API root; always ends with a `/`
    pub api_base_url: Url,
    /// Bearer token for the backend API
    pub api_token: Option<SecretString>,
    /// Maximum number of cart rows requested per load
    pub fetch_limit: u32,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for CartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("fetch_limit", &self.fetch_limit)
            .field("http_timeout", &self.http_timeout)
            .field("currency", &self.currency)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base = lookup("PICKNGO_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = parse_base_url(&base).map_err(|e| {
            ConfigError::InvalidEnvVar("PICKNGO_API_BASE_URL".to_string(), e)
        })?;

        let fetch_limit = parse_or_default("PICKNGO_FETCH_LIMIT", &lookup, DEFAULT_FETCH_LIMIT)?;
        if fetch_limit == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PICKNGO_FETCH_LIMIT".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let timeout_secs = parse_or_default(
            "PICKNGO_HTTP_TIMEOUT_SECS",
            &lookup,
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;

        let currency = lookup("PICKNGO_CURRENCY")
            .map(|raw| raw.parse::<CurrencyCode>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("PICKNGO_CURRENCY".to_string(), e))?
            .unwrap_or_default();

        Ok(Self {
            api_base_url,
            api_token: lookup("PICKNGO_API_TOKEN")
                .filter(|token| !token.trim().is_empty())
                .map(SecretString::from),
            fetch_limit,
            http_timeout: Duration::from_secs(timeout_secs),
            currency,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `base_url` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = base_url.to_string();
        Self::from_lookup(move |key| {
            (key == "PICKNGO_API_BASE_URL").then(|| base_url.clone())
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API root, forcing a trailing slash so relative joins append.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<T>(
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
