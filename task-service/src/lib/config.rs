use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use http::HeaderValue;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HashingConfig {
    /// Argon2 time cost
    pub cost: u32,
}

/// Which credential store backs the service.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    /// Single allowed origin; any origin when unset
    pub allowed_origin: Option<String>,
}

impl CorsConfig {
    /// Allowed origin as a header value.
    pub fn origin(&self) -> Result<Option<HeaderValue>, ConfigValidationError> {
        self.allowed_origin
            .as_deref()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| ConfigValidationError::InvalidCorsOrigin(origin.to_string()))
            })
            .transpose()
    }
}

/// Identity created at startup when the store is empty.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SeedConfig {
    /// Username and password, when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Configuration rejected after loading
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("jwt.secret must be at least {min} bytes, got {actual}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("jwt.ttl_seconds must be positive, got {0}")]
    NonPositiveTtl(i64),

    #[error("jwt.ttl_seconds must be at most {max}, got {actual}")]
    TtlTooLarge { max: i64, actual: i64 },

    #[error("hashing.cost must be at least 1")]
    ZeroHashingCost,

    #[error("cors.allowed_origin is not a valid header value: {0:?}")]
    InvalidCorsOrigin(String),
}

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error(transparent)]
    Source(#[from] ConfigError),

    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    pub const MIN_SECRET_LENGTH: usize = 32;
    /// One year.
    pub const MAX_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, LoadConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Check invariants the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let secret_length = self.jwt.secret.len();
        if secret_length < Self::MIN_SECRET_LENGTH {
            return Err(ConfigValidationError::SecretTooShort {
                min: Self::MIN_SECRET_LENGTH,
                actual: secret_length,
            });
        }
        if self.jwt.ttl_seconds <= 0 {
            return Err(ConfigValidationError::NonPositiveTtl(self.jwt.ttl_seconds));
        }
        if self.jwt.ttl_seconds > Self::MAX_TTL_SECONDS {
            return Err(ConfigValidationError::TtlTooLarge {
                max: Self::MAX_TTL_SECONDS,
                actual: self.jwt.ttl_seconds,
            });
        }
        if self.hashing.cost == 0 {
            return Err(ConfigValidationError::ZeroHashingCost);
        }
        self.cors.origin()?;
        Ok(())
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.jwt.ttl_seconds)
    }
}
