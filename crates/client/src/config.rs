//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VERITAS_BASE_URL` - Base URL of the Veritas backend (e.g., `https://veritas.example.com`)
//!
//! ## Optional
//! - `VERITAS_CACHE_PATH` - Path of the persistent session cache (default: `veritas-session.json`)
//! - `VERITAS_VALIDATE_INTERVAL_SECS` - Periodic re-validation interval (default: 120)
//! - `VERITAS_IDLE_TIMEOUT_SECS` - Idle debounce before a post-inactivity validation (default: 300)
//! - `VERITAS_REQUEST_TIMEOUT_SECS` - Per-request HTTP timeout (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_CACHE_PATH: &str = "veritas-session.json";
const DEFAULT_VALIDATE_INTERVAL_SECS: u64 = 120;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Veritas client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend; endpoint paths are joined onto this.
    pub base_url: Url,
    /// Path of the persistent session cache file.
    pub cache_path: PathBuf,
    /// How often the scheduler re-validates authentication state.
    pub validate_interval: Duration,
    /// How long the user must be inactive before the next recorded
    /// activity triggers a validation.
    pub idle_timeout: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `VERITAS_BASE_URL` is missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(&get_required_env("VERITAS_BASE_URL")?)?;
        let cache_path =
            PathBuf::from(get_env_or_default("VERITAS_CACHE_PATH", DEFAULT_CACHE_PATH));
        let validate_interval =
            get_duration_secs("VERITAS_VALIDATE_INTERVAL_SECS", DEFAULT_VALIDATE_INTERVAL_SECS)?;
        let idle_timeout =
            get_duration_secs("VERITAS_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS)?;
        let request_timeout =
            get_duration_secs("VERITAS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            base_url,
            cache_path,
            validate_interval,
            idle_timeout,
            request_timeout,
        })
    }

    /// Build a configuration programmatically from a base URL.
    ///
    /// All other fields take their defaults; integration tests and embedders
    /// override them directly.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL cannot be parsed.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            validate_interval: Duration::from_secs(DEFAULT_VALIDATE_INTERVAL_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a duration (in whole seconds) with a default value.
fn get_duration_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    let secs = get_env_or_default(key, &default.to_string())
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(Duration::from_secs(secs))
}

/// Parse and sanity-check the backend base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("VERITAS_BASE_URL".to_string(), e.to_string()))?;

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "VERITAS_BASE_URL".to_string(),
            "URL must have a host".to_string(),
        ));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_valid() {
        let url = parse_base_url("https://veritas.example.com").unwrap();
        assert_eq!(url.host_str(), Some("veritas.example.com"));
    }

    #[test]
    fn test_parse_base_url_with_port() {
        let url = parse_base_url("http://127.0.0.1:5000").unwrap();
        assert_eq!(url.port(), Some(5000));
    }

    #[test]
    fn test_parse_base_url_not_a_url() {
        let result = parse_base_url("not a url");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_parse_base_url_missing_host() {
        let result = parse_base_url("unix:/run/veritas.sock");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new("http://localhost:5000").unwrap();
        assert_eq!(config.validate_interval, Duration::from_secs(120));
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.cache_path, PathBuf::from("veritas-session.json"));
    }
}
