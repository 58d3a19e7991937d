//! Configuration module for the AnimeKompi API
//!
//! Handles loading environment variables and application configuration.

use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{DEFAULT_SITE_URL, DEFAULT_UPSTREAM_BASE_URL};
use crate::upstream::ClientConfig;

/// Configuration loading errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Secret key for signing admin sessions
    pub jwt_secret: String,
    /// Base URL of the upstream catalog API
    pub upstream_base_url: String,
    /// Public site address for the sitemap and canonical links
    pub site_url: String,
    /// How long upstream responses are cached
    pub upstream_cache_ttl: Duration,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            None => 8080,
        };

        let cache_secs: u64 = match lookup("UPSTREAM_CACHE_TTL_SECS") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "UPSTREAM_CACHE_TTL_SECS",
                value,
            })?,
            None => 60,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            jwt_secret: required("JWT_SECRET")?,
            upstream_base_url: lookup("UPSTREAM_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string()),
            site_url: lookup("SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            upstream_cache_ttl: Duration::from_secs(cache_secs),
        })
    }

    /// Upstream client settings derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.upstream_base_url.clone(),
            cache_ttl: self.upstream_cache_ttl,
            ..ClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/animekompi"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream_base_url, DEFAULT_UPSTREAM_BASE_URL);
        assert_eq!(config.site_url, "https://animekompi.fun");
        assert_eq!(config.upstream_cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("PORT", "9000"),
            ("UPSTREAM_BASE_URL", "http://localhost:3000/api/"),
            ("UPSTREAM_CACHE_TTL_SECS", "0"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.upstream_base_url, "http://localhost:3000/api");
        assert!(config.client_config().cache_ttl.is_zero());
    }

    #[test]
    fn test_missing_required() {
        let result = Config::from_lookup(lookup(&[("JWT_SECRET", "secret")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("DATABASE_URL"));

        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "  "),
        ]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value 'eighty'");
    }
}
