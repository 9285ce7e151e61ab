//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use myshop_products::Currency;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    pub currency: Currency,
    /// Prefix of public product pages, e.g. `/shop` gives `/shop/<slug>`.
    pub product_url_prefix: String,
    /// Insert default manufacturers, operating systems and images on start.
    pub seed: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            currency: Currency::default(),
            product_url_prefix: "/shop".to_string(),
            seed: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (used by tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup("MYSHOP_BIND_ADDR") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "MYSHOP_BIND_ADDR",
                message: format!("{e}"),
            })?,
            None => defaults.bind_addr,
        };

        let currency = match lookup("MYSHOP_CURRENCY") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                key: "MYSHOP_CURRENCY",
                message: format!("{e}"),
            })?,
            None => defaults.currency,
        };

        let product_url_prefix = lookup("MYSHOP_PRODUCT_URL_PREFIX")
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.product_url_prefix);

        let seed = match lookup("MYSHOP_SEED") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "MYSHOP_SEED",
                message: format!("expected true or false, got {raw:?}"),
            })?,
            None => defaults.seed,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            bind_addr,
            database_url,
            currency,
            product_url_prefix,
            seed,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MYSHOP_BIND_ADDR", "127.0.0.1:9000"),
            ("MYSHOP_CURRENCY", "usd"),
            ("MYSHOP_PRODUCT_URL_PREFIX", "/store/"),
            ("MYSHOP_SEED", "off"),
            ("DATABASE_URL", "postgres://localhost/myshop"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.currency, Currency::Usd);
        assert_eq!(config.product_url_prefix, "/store");
        assert!(!config.seed);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/myshop"));
    }

    #[test]
    fn rejects_bad_values() {
        let err = AppConfig::from_lookup(lookup(&[("MYSHOP_SEED", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MYSHOP_SEED", .. }));

        let err = AppConfig::from_lookup(lookup(&[("MYSHOP_CURRENCY", "XYZ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MYSHOP_CURRENCY", .. }));
    }
}
