//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    CIPHER_KEY_BYTES, DEFAULT_ANONYMOUS_ID_MAX_ATTEMPTS, DEFAULT_DATABASE_MAX_CONNECTIONS,
    DEFAULT_GRADING_SCALE, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_STORAGE_ROOT,
};
use crate::utils::crypto::{CipherSetupError, PathCipher};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cipher: CipherConfig,
    pub storage: StorageConfig,
    pub workflow: WorkflowConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Which persistence backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Access token verification configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the upstream identity provider
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

/// Path encryption key ring
#[derive(Clone)]
pub struct CipherConfig {
    pub keys: Vec<(String, Vec<u8>)>,
    pub active_key: String,
}

impl std::fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.keys.iter().map(|(id, _)| id.as_str()).collect();
        f.debug_struct("CipherConfig")
            .field("key_ids", &ids)
            .field("active_key", &self.active_key)
            .finish()
    }
}

impl CipherConfig {
    /// Build the path cipher from this key ring
    pub fn build_cipher(&self) -> Result<PathCipher, CipherSetupError> {
        PathCipher::new(
            self.keys.iter().map(|(id, key)| (id.as_str(), key.as_slice())),
            &self.active_key,
        )
    }
}

/// File storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
}

/// Workflow tuning
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub anonymous_id_max_attempts: u32,
    pub grading_scale: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            anonymous_id_max_attempts: DEFAULT_ANONYMOUS_ID_MAX_ATTEMPTS,
            grading_scale: DEFAULT_GRADING_SCALE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            cipher: CipherConfig::from_env()?,
            storage: StorageConfig::from_env(),
            workflow: WorkflowConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        };

        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".to_string()))?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format,
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok("memory") => StoreBackend::Memory,
            Ok(_) => return Err(ConfigError::InvalidValue("STORE_BACKEND".to_string())),
        };

        let url = env::var("DATABASE_URL").ok();
        if backend == StoreBackend::Postgres && url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL".to_string()));
        }

        Ok(Self {
            backend,
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_DATABASE_MAX_CONNECTIONS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string()))?,
        })
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET".to_string()))?,
        })
    }
}

impl CipherConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var("CIPHER_KEYS")
            .map_err(|_| ConfigError::Missing("CIPHER_KEYS".to_string()))?;
        let keys = parse_key_ring(&raw)?;

        let active_key = match env::var("CIPHER_ACTIVE_KEY") {
            Ok(id) => id,
            Err(_) => keys
                .first()
                .map(|(id, _)| id.clone())
                .ok_or_else(|| ConfigError::InvalidValue("CIPHER_KEYS".to_string()))?,
        };

        Ok(Self { keys, active_key })
    }
}

/// Parse `id:hex[,id:hex...]` into raw AES-256 keys
pub fn parse_key_ring(raw: &str) -> Result<Vec<(String, Vec<u8>)>, ConfigError> {
    let invalid = || ConfigError::InvalidValue("CIPHER_KEYS".to_string());

    let mut keys = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (id, hex_key) = entry.split_once(':').ok_or_else(invalid)?;
        let key = hex::decode(hex_key.trim()).map_err(|_| invalid())?;
        if id.trim().is_empty() || key.len() != CIPHER_KEY_BYTES {
            return Err(invalid());
        }
        keys.push((id.trim().to_string(), key));
    }

    if keys.is_empty() {
        return Err(invalid());
    }
    Ok(keys)
}

impl StorageConfig {
    fn from_env() -> Self {
        Self {
            root: PathBuf::from(
                env::var("STORAGE_ROOT").unwrap_or_else(|_| DEFAULT_STORAGE_ROOT.to_string()),
            ),
        }
    }
}

impl WorkflowConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let anonymous_id_max_attempts: u32 = env::var("ANONYMOUS_ID_MAX_ATTEMPTS")
            .unwrap_or_else(|_| DEFAULT_ANONYMOUS_ID_MAX_ATTEMPTS.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("ANONYMOUS_ID_MAX_ATTEMPTS".to_string()))?;
        let grading_scale: f64 = env::var("GRADING_SCALE")
            .unwrap_or_else(|_| DEFAULT_GRADING_SCALE.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("GRADING_SCALE".to_string()))?;

        if anonymous_id_max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "ANONYMOUS_ID_MAX_ATTEMPTS".to_string(),
            ));
        }
        if !grading_scale.is_finite() || grading_scale <= 0.0 {
            return Err(ConfigError::InvalidValue("GRADING_SCALE".to_string()));
        }

        Ok(Self {
            anonymous_id_max_attempts,
            grading_scale,
        })
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let server = ServerConfig {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            rust_log: "info".to_string(),
            log_format: LogFormat::Pretty,
        };
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);

        let workflow = WorkflowConfig::default();
        assert_eq!(workflow.grading_scale, 20.0);
    }

    #[test]
    fn test_parse_key_ring() {
        let a = "11".repeat(32);
        let b = "22".repeat(32);
        let keys = parse_key_ring(&format!("2025:{a}, 2026:{b}")).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].0, "2025");
        assert_eq!(keys[1].1, vec![0x22; 32]);

        assert!(parse_key_ring("").is_err());
        assert!(parse_key_ring("k1:abcd").is_err());
        assert!(parse_key_ring(&format!(":{a}")).is_err());
        assert!(parse_key_ring("k1:not-hex").is_err());
    }

    #[test]
    fn test_cipher_config_builds_cipher_and_hides_keys() {
        let config = CipherConfig {
            keys: vec![("k1".to_string(), vec![3u8; 32])],
            active_key: "k1".to_string(),
        };
        let cipher = config.build_cipher().unwrap();
        assert_eq!(cipher.active_key_id(), "k1");
        assert!(!format!("{:?}", config).contains("3, 3"));
    }
}
