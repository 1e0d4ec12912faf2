//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::storage::StorageConfig;

const ENV_PREFIX: &str = "BOARDHOP";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Blob storage backend.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Bearer token verification.
    pub auth: AuthConfig,
    /// Listing pagination bounds.
    #[serde(default)]
    pub listing: ListingConfig,
    /// Media upload limits.
    #[serde(default)]
    pub media: MediaConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Identity token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to verify bearer tokens.
    pub jwt_secret: String,
    /// Expected `iss` claim, if any.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Expected `aud` claim, if any.
    #[serde(default)]
    pub audience: Option<String>,
}

/// Page size bounds for list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListingConfig {
    /// Page size used when the caller supplies none or an invalid one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Largest page size a caller may request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Limits applied to uploaded media before any write happens.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MediaConfig {
    /// Maximum number of files per request.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum size of a single file in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_page_size() -> u64 {
    25
}

const fn default_max_page_size() -> u64 {
    50
}

const fn default_max_files() -> usize {
    10
}

const fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `BOARDHOP_ENV`)
    /// 3. Environment variables with `BOARDHOP_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("BOARDHOP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let raw = config::Config::builder()
            .set_override("server.url", "http://localhost:8080")
            .and_then(|b| b.set_override("database.url", "postgres://localhost/boardhop"))
            .and_then(|b| b.set_override("auth.jwt_secret", "secret"))
            .and_then(|b| b.build())
            .unwrap();
        let config: Config = raw.try_deserialize().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.listing.default_page_size, 25);
        assert_eq!(config.listing.max_page_size, 50);
        assert_eq!(config.media.max_files, 10);
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
    }
}
