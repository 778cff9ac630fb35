//! API Server Configuration
//!
//! Loaded from a JSON file; every key is optional.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config '{path}': {message}")]
    Read { path: String, message: String },

    /// Config file is not valid JSON for [`ApiConfig`]
    #[error("Invalid config JSON: {0}")]
    Parse(String),

    /// Values parse but are inconsistent
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// REST API server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Version segment of every resource URI (default: "v1")
    #[serde(default = "default_api_name")]
    pub api_name: String,

    /// Mount point of the API (default: "/")
    #[serde(default = "default_script_prefix")]
    pub script_prefix: String,

    /// Page size when the request has no `limit` (default: 20)
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Largest page a client may request (default: 1000)
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Detail cache capacity per resource; 0 disables caching (default: 1000)
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// CORS allowed origins; empty allows any (default: [])
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Minimum log severity (default: "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_name() -> String {
    "v1".to_string()
}

fn default_script_prefix() -> String {
    "/".to_string()
}

fn default_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    1000
}

fn default_cache_max_entries() -> usize {
    1000
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_name: default_api_name(),
            script_prefix: default_script_prefix(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            cache_max_entries: default_cache_max_entries(),
            cors_origins: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl ApiConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config = Self::from_json(&content)?;
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path.display().to_string().as_str())],
        );
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: ApiConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.api_name.is_empty() || self.api_name.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "api_name must be a single non-empty path segment, got '{}'",
                self.api_name
            )));
        }

        if !self.script_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "script_prefix must start with '/', got '{}'",
                self.script_prefix
            )));
        }

        if self.max_limit == 0 {
            return Err(ConfigError::Invalid("max_limit must be > 0".to_string()));
        }

        if self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }

        if crate::observability::Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Unknown log_level: '{}'",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.api_name, "v1");
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.max_limit, 1000);
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig::with_port(8080);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        assert_eq!(ApiConfig::from_json("{}").unwrap(), ApiConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docrest.json");
        let config = json!({"port": 9001, "script_prefix": "/svc/", "default_limit": 5});
        fs::write(&path, config.to_string()).unwrap();

        let config = ApiConfig::load(&path).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.script_prefix, "/svc/");
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.api_name, "v1");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = ApiConfig::load(&temp_dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ApiConfig::from_json(r#"{"default_limit": 50, "max_limit": 10}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ApiConfig::from_json(r#"{"api_name": "v1/beta"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ApiConfig::from_json(r#"{"script_prefix": "svc"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ApiConfig::from_json(r#"{"log_level": "LOUD"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ApiConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
