//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `EMPORIUM_API_URL` - Base URL of the shop API gateway (default: `http://localhost:8080/api`)
//! - `EMPORIUM_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `EMPORIUM_TOKEN_PATH` - File holding the persisted session token (default: `.emporium/session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_TOKEN_PATH: &str = ".emporium/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every service path is appended to
    pub api_url: Url,
    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
    /// Where the session token is persisted between runs
    pub token_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("EMPORIUM_API_URL", DEFAULT_API_URL))?;
        let timeout_secs = get_env_or_default("EMPORIUM_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "EMPORIUM_REQUEST_TIMEOUT_SECS".to_string(),
                    e.to_string(),
                )
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "EMPORIUM_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let token_path = PathBuf::from(get_env_or_default("EMPORIUM_TOKEN_PATH", DEFAULT_TOKEN_PATH));

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            token_path,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_url` with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not an http(s) URL.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            request_timeout: Duration::from_secs(30),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and check the API base URL.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("EMPORIUM_API_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "EMPORIUM_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "EMPORIUM_API_URL".to_string(),
            "must be an absolute base URL".to_string(),
        ));
    }

    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_accepts_http() {
        let url = parse_api_url("https://shop.example/api").unwrap();
        assert_eq!(url.host_str(), Some("shop.example"));
        assert_eq!(url.path(), "/api");
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        let err = parse_api_url("ftp://shop.example").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "EMPORIUM_API_URL"));
    }

    #[test]
    fn test_parse_api_url_rejects_garbage() {
        assert!(parse_api_url("not a url").is_err());
        assert!(parse_api_url("mailto:shop@example.com").is_err());
    }

    #[test]
    fn test_for_api_url_defaults() {
        let config = ClientConfig::for_api_url("http://127.0.0.1:9000").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.token_path, PathBuf::from(".emporium/session.json"));
        assert!(config.sentry_dsn.is_none());
    }
}
