//! Configuration module for the Sema Gateway server
//!
//! Configuration is loaded from environment variables (with `.env` support
//! via `dotenvy` in `main`) or from a YAML file. Priority: YAML > env vars
//! > defaults.
//!
//! # Example
//! ```rust,no_run
//! use sema_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from a YAML file with environment variable fallbacks
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::Deserialize;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the YAML document
    #[error("Failed to parse configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value failed validation
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid {
        /// The offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Plugin made the registry default at startup, once activated
    pub default_plugin: Option<String>,

    /// Plugins activated synchronously at startup
    pub autoactivate: Vec<String>,

    /// Comma-separated CORS origins, `*` for any, unset for same-origin only
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            default_plugin: Some("wordcount".to_string()),
            autoactivate: vec!["wordcount".to_string(), "pattern".to_string()],
            cors_allowed_origins: None,
        }
    }
}

/// Partial configuration as it appears in a YAML file; every field is
/// optional and falls back to the env/default value.
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    host: Option<String>,
    port: Option<u16>,
    default_plugin: Option<String>,
    autoactivate: Option<Vec<String>>,
    cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::Invalid {
                field: "port",
                reason: format!("'{port}' is not a valid port number"),
            })?;
        }
        if let Ok(default_plugin) = std::env::var("DEFAULT_PLUGIN") {
            config.default_plugin = if default_plugin.is_empty() {
                None
            } else {
                Some(default_plugin)
            };
        }
        if let Ok(autoactivate) = std::env::var("AUTOACTIVATE") {
            config.autoactivate = autoactivate
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            config.cors_allowed_origins = Some(origins);
        }

        Ok(config)
    }

    /// Load configuration from a YAML file, with env values as fallbacks
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_env()?;
        let contents = std::fs::read_to_string(path)?;
        let yaml: YamlConfig = serde_yaml::from_str(&contents)?;

        if let Some(host) = yaml.host {
            config.host = host;
        }
        if let Some(port) = yaml.port {
            config.port = port;
        }
        if let Some(default_plugin) = yaml.default_plugin {
            config.default_plugin = Some(default_plugin);
        }
        if let Some(autoactivate) = yaml.autoactivate {
            config.autoactivate = autoactivate;
        }
        if let Some(origins) = yaml.cors_allowed_origins {
            config.cors_allowed_origins = Some(origins);
        }

        Ok(config)
    }

    /// The socket address string the server binds to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
