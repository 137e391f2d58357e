//! Centralized instance configuration.
//!
//! A single source of truth for the daemon, loaded from environment
//! variables with sensible defaults and validation.

use std::fmt;

/// Identity of this instance.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    /// Public base URL this instance is reachable at.
    pub instance_url: String,
    /// Unique id for this instance.
    pub instance_id: String,
    /// Human-readable instance name.
    pub instance_name: String,
    /// Name of the platform service itself.
    pub service_name: String,
    /// Platform version string.
    pub version: String,
}

impl InstanceConfig {
    /// Load instance identity from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            instance_url: env_or("HC2_INSTANCE_URL", "http://localhost:9200"),
            instance_id: env_or("HC2_INSTANCE_ID", "hc2-local"),
            instance_name: env_or("HC2_INSTANCE_NAME", "honeycomb"),
            service_name: env_or("HC2_SERVICE_NAME", "HC2ControlPlane"),
            version: env_or("HC2_VERSION", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Default identity (useful for testing).
    pub fn default_config() -> Self {
        Self {
            instance_url: "http://localhost:9200".to_string(),
            instance_id: "hc2-local".to_string(),
            instance_name: "honeycomb".to_string(),
            service_name: "HC2ControlPlane".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Listening configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Gateway (public) port.
    pub port: u16,
    /// Registry (internal) port, fronted by the gateway.
    pub registry_port: u16,
    /// Bind address for both listeners.
    pub bind_addr: String,
}

impl NetworkConfig {
    /// Load listening configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let port = parse_port("HC2_PORT", 9200)?;
        let registry_port = parse_port("HC2_REGISTRY_PORT", 9201)?;
        if port == registry_port {
            return Err(ConfigError::InvalidValue {
                key: "HC2_REGISTRY_PORT".to_string(),
                value: registry_port.to_string(),
                reason: "registry port must differ from the gateway port".to_string(),
            });
        }
        Ok(Self {
            port,
            registry_port,
            bind_addr: env_or("HC2_BIND_ADDR", "0.0.0.0"),
        })
    }

    /// Default listening configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            port: 9200,
            registry_port: 9201,
            bind_addr: "0.0.0.0".to_string(),
        }
    }
}

/// Durable store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the HTTP document store; `None` selects the in-memory
    /// store (single-process deployments and tests).
    pub url: Option<String>,
    /// Database name holding registration documents.
    pub database: String,
}

impl StoreConfig {
    /// Load store configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let url = std::env::var("HC2_STORE_URL").ok().filter(|v| !v.is_empty());
        if let Some(url) = &url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    key: "HC2_STORE_URL".to_string(),
                    value: url.clone(),
                    reason: "must start with http:// or https://".to_string(),
                });
            }
        }
        Ok(Self {
            url,
            database: env_or("HC2_STORE_DB", "hc2-registrations"),
        })
    }

    /// Default store configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            url: None,
            database: "hc2-registrations".to_string(),
        }
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub instance: InstanceConfig,
    pub network: NetworkConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load and validate the complete configuration.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            instance: InstanceConfig::load()?,
            network: NetworkConfig::load()?,
            store: StoreConfig::load()?,
        })
    }

    /// Default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            instance: InstanceConfig::default_config(),
            network: NetworkConfig::default_config(),
            store: StoreConfig::default_config(),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// A configuration value is invalid.
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "invalid configuration for {}: '{}' ({})", key, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_port(key: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) if raw.is_empty() => Ok(default),
        Ok(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
            reason: format!("must be a valid port number (0-65535): {}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_coherent() {
        let config = AppConfig::default_config();
        assert_eq!(config.network.port, 9200);
        assert_eq!(config.network.registry_port, 9201);
        assert_ne!(config.network.port, config.network.registry_port);
        assert!(config.store.url.is_none());
        assert_eq!(config.store.database, "hc2-registrations");
    }

    #[test]
    fn config_error_display_names_the_key() {
        let err = ConfigError::InvalidValue {
            key: "HC2_PORT".to_string(),
            value: "notaport".to_string(),
            reason: "must be a valid port number".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("HC2_PORT"));
        assert!(message.contains("notaport"));
    }
}
