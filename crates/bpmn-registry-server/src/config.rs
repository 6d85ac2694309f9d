//! Configuration for the BPMN Registry Server
//!
//! This module contains the configuration types and loading functionality.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// URL of the process store (`memory://...` or `sqlite:...`)
    #[serde(default = "default_store_url")]
    pub store_url: String,

    /// Maximum number of pooled store connections
    #[serde(default = "default_store_max_connections")]
    pub store_max_connections: u32,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Allow every origin, method and header
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

fn default_port() -> u16 {
    8001
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_store_url() -> String {
    "memory://local".to_string()
}

fn default_store_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_cors_permissive() -> bool {
    true
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    /// Load configuration from an optional `.env` file and environment variables
    pub fn load() -> ServerResult<Self> {
        if let Ok(path) = dotenv::dotenv() {
            info!("Loaded environment from {}", path.display());
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from a variable lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> ServerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.port = port;
            } else {
                warn!("Invalid SERVER_PORT value: {}", port);
            }
        }

        if let Some(host) = lookup("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Some(store_url) = lookup("PROCESS_STORE_URL") {
            config.store_url = store_url;
        }

        if let Some(max) = lookup("STORE_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) if max > 0 => config.store_max_connections = max,
                _ => warn!("Invalid STORE_MAX_CONNECTIONS value: {}", max),
            }
        }

        if let Some(log_level) = lookup("LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" => LogFormat::Text,
                _ => {
                    warn!("Invalid LOG_FORMAT value: {}, using text", format);
                    LogFormat::Text
                }
            };
        }

        if let Some(cors) = lookup("CORS_PERMISSIVE") {
            match parse_bool(&cors) {
                Some(enabled) => config.cors_permissive = enabled,
                None => warn!("Invalid CORS_PERMISSIVE value: {}", cors),
            }
        }

        // Validate required fields
        if config.store_url.trim().is_empty() {
            return Err(ServerError::ConfigError(
                "Process store URL is required".to_string(),
            ));
        }

        if config.store_url.starts_with("memory://") {
            warn!("Using in-memory process store - records will not survive a restart");
        }

        if !config.cors_permissive {
            info!("Permissive CORS disabled");
        }

        info!("Loaded server configuration");
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            store_url: default_store_url(),
            store_max_connections: default_store_max_connections(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            cors_permissive: default_cors_permissive(),
        }
    }
}
