//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup and held in memory; handlers only
//! ever see an owned `Config`.

use std::env;

/// Default access-token lifetime: 1 hour.
const DEFAULT_ACCESS_TTL_SECS: u64 = 60 * 60;
/// Default refresh-token lifetime: 10 days.
const DEFAULT_REFRESH_TTL_SECS: u64 = 10 * 24 * 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub cors_origin: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,

    /// Signing secret for access tokens (raw bytes)
    pub access_token_secret: Vec<u8>,
    /// Signing secret for refresh tokens (raw bytes, distinct from access)
    pub refresh_token_secret: Vec<u8>,
    /// Access-token lifetime in seconds
    pub access_token_ttl_secs: u64,
    /// Refresh-token lifetime in seconds
    pub refresh_token_ttl_secs: u64,

    /// Upload endpoint of the external media host
    pub media_upload_url: String,
    /// API key for the media host
    pub media_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?
            .into_bytes();
        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?
            .into_bytes();

        // Identical secrets would let an access token pass as a refresh token.
        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::Invalid(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ",
            ));
        }

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_secs: parse_ttl("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL_SECS),
            refresh_token_ttl_secs: parse_ttl("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL_SECS),
            media_upload_url: env::var("MEDIA_UPLOAD_URL")
                .map_err(|_| ConfigError::Missing("MEDIA_UPLOAD_URL"))?,
            media_api_key: env::var("MEDIA_API_KEY")
                .map_err(|_| ConfigError::Missing("MEDIA_API_KEY"))?,
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            cors_origin: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            access_token_secret: b"test_access_secret_32_bytes_min!".to_vec(),
            refresh_token_secret: b"test_refresh_secret_32_bytes_ok!".to_vec(),
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            media_upload_url: "http://localhost:9999/upload".to_string(),
            media_api_key: "test_media_key".to_string(),
        }
    }
}

fn parse_ttl(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_distinct_secrets() {
        let config = Config::test_default();
        assert_ne!(config.access_token_secret, config.refresh_token_secret);
        assert!(config.access_token_ttl_secs < config.refresh_token_ttl_secs);
    }
}
