//! Quote CLI configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

use bundle_core::currency::DEFAULT_CURRENCY;
use bundle_core::validation::validate_currency_code;
use serde::{Deserialize, Serialize};

/// Quote CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// SQLite catalog path
    pub database_path: PathBuf,

    /// Currency used when the command line does not name one
    pub default_currency: String,

    /// Catalog pool size
    pub db_max_connections: u32,

    /// Quotes allowed per customer per minute
    pub quote_rate_limit: u32,

    /// Redis connection string (optional)
    pub redis_url: Option<String>,
}

impl QuoteConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = QuoteConfig {
            database_path: lookup("BUNDLE_DB_PATH")
                .unwrap_or_else(|| "./bundles.db".to_string())
                .into(),

            default_currency: lookup("DEFAULT_CURRENCY")
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
                .trim()
                .to_ascii_uppercase(),

            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            quote_rate_limit: lookup("QUOTE_RATE_LIMIT")
                .unwrap_or_else(|| "60".to_string()) // per minute
                .parse()
                .map_err(|_| ConfigError::InvalidValue("QUOTE_RATE_LIMIT".to_string()))?,

            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
        };

        validate_currency_code(&config.default_currency)
            .map_err(|_| ConfigError::InvalidValue("DEFAULT_CURRENCY".to_string()))?;

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.quote_rate_limit == 0 {
            return Err(ConfigError::InvalidValue("QUOTE_RATE_LIMIT".to_string()));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(vars: &[(&str, &str)]) -> Result<QuoteConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QuoteConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./bundles.db"));
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.quote_rate_limit, 60);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load_with(&[
            ("BUNDLE_DB_PATH", "/var/lib/shop/catalog.db"),
            ("DEFAULT_CURRENCY", " eur "),
            ("QUOTE_RATE_LIMIT", "10"),
            ("REDIS_URL", "redis://127.0.0.1/"),
        ])
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/shop/catalog.db"));
        assert_eq!(config.default_currency, "EUR");
        assert_eq!(config.quote_rate_limit, 10);
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1/"));
    }

    #[test]
    fn test_invalid_values() {
        let err = load_with(&[("DB_MAX_CONNECTIONS", "many")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for DB_MAX_CONNECTIONS");

        let err = load_with(&[("DEFAULT_CURRENCY", "dollars")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for DEFAULT_CURRENCY");

        assert!(load_with(&[("QUOTE_RATE_LIMIT", "0")]).is_err());
    }

    #[test]
    fn test_blank_redis_url_is_unset() {
        let config = load_with(&[("REDIS_URL", "  ")]).unwrap();
        assert!(config.redis_url.is_none());
    }
}
