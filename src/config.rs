//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::api::ClientConfig;
use crate::session::{Role, Session};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Studio backend connection
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Settings for the HTTP client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone().filter(|t| !t.is_empty()),
            request_timeout_ms: self.request_timeout_secs.saturating_mul(1000),
        }
    }
}

/// Who operates the desk
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "operator".to_string())
}

fn default_role() -> Role {
    Role::Operator
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            role: default_role(),
        }
    }
}

impl SessionConfig {
    pub fn session(&self) -> Session {
        Session::new(self.user.clone(), self.role)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load an explicit file, or the first default location that exists.
    ///
    /// An explicit path that fails to load is an error; default locations
    /// that fail are skipped with a warning.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_with_env(path);
        }
        Ok(Self::load_default())
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("velodesk").join("config.toml")),
            Some(PathBuf::from("./velodesk.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(url) = var("VELODESK_API_URL") {
            self.api.base_url = url;
        }
        if let Some(token) = var("VELODESK_API_TOKEN") {
            self.api.token = Some(token);
        }
        if let Some(timeout) = var("VELODESK_API_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.api.request_timeout_secs = t;
            }
        }

        // Session overrides
        if let Some(user) = var("VELODESK_USER") {
            self.session.user = user;
        }
        if let Some(role) = var("VELODESK_ROLE") {
            match role.parse() {
                Ok(r) => self.session.role = r,
                Err(e) => tracing::warn!("Ignoring VELODESK_ROLE: {}", e),
            }
        }

        // Logging overrides
        if let Some(level) = var("VELODESK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("VELODESK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Velodesk Configuration
#
# Environment variables override these settings:
# - VELODESK_API_URL
# - VELODESK_API_TOKEN
# - VELODESK_API_TIMEOUT_SECS
# - VELODESK_USER
# - VELODESK_ROLE
# - VELODESK_LOG_LEVEL
# - VELODESK_LOG_FORMAT

[api]
# Studio backend origin; request paths start with /api
base_url = "http://localhost:8000"

# Bearer token sent with every request
# token = ""

# Request timeout in seconds
request_timeout_secs = 15

[session]
# Name shown in logs
user = "operator"

# admin or operator; only admins can rearrange seating,
# change slot settings and copy seating
role = "operator"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json
format = "pretty"
"#
    .to_string()
}
