//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `SERVER_HOST`: Bind address (default: 0.0.0.0)
//! - `SERVER_PORT`: Bind port (default: 8080)
//! - `IDENTITY_HEADER`: Header carrying the verified user email (default: x-user-email)
//! - `CATALOG_URL`: Popular tracks endpoint of the catalog source (optional)
//! - `VOTES_PER_PERIOD`: Quota granted per refresh period (default: 10)
//! - `VOTE_REFRESH_DAYS`: Length of a refresh period in days (default: 30)
//! - `RECONCILE_ON_STARTUP`: Repair drifted vote counters before serving (default: false)
//! - `CORS_ORIGINS`: Comma-separated allowed origins (default: http://localhost:3000)
mod cors;

use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use axum::http::{HeaderName, HeaderValue};
use chrono::Duration;
use thiserror::Error;
use tracing::info;
use track_votes_ledger::QuotaPolicy;
use track_votes_ledger::quota::{DEFAULT_REFRESH_DAYS, DEFAULT_VOTES_PER_PERIOD};

pub use cors::create_cors_layer;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_IDENTITY_HEADER: &str = "x-user-email";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl Into<String>, reason: impl Display) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Settings of the HTTP server and its dependencies.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: IpAddr,
    pub port: u16,
    pub identity_header: HeaderName,
    pub catalog_url: Option<String>,
    pub votes_per_period: i32,
    pub vote_refresh_days: i64,
    pub reconcile_on_startup: bool,
    pub cors_origins: Vec<HeaderValue>,
}

impl ApiConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration from `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if database_max_connections == 0 {
            return Err(ConfigError::invalid("DATABASE_MAX_CONNECTIONS", "0", "must be at least 1"));
        }

        let host = parse_or(&lookup, "SERVER_HOST", DEFAULT_HOST)?;
        let port = parse_or(&lookup, "SERVER_PORT", DEFAULT_PORT)?;

        let identity_header = lookup("IDENTITY_HEADER").unwrap_or_else(|| {
            info!("IDENTITY_HEADER not set, using default: {DEFAULT_IDENTITY_HEADER}");
            DEFAULT_IDENTITY_HEADER.to_string()
        });
        let identity_header = HeaderName::from_bytes(identity_header.as_bytes())
            .map_err(|e| ConfigError::invalid("IDENTITY_HEADER", identity_header.clone(), e))?;

        let catalog_url = lookup("CATALOG_URL");
        if catalog_url.is_none() {
            info!("CATALOG_URL not set, popular tracks are unavailable");
        }

        let votes_per_period = parse_or(&lookup, "VOTES_PER_PERIOD", DEFAULT_VOTES_PER_PERIOD)?;
        if votes_per_period < 0 {
            return Err(ConfigError::invalid(
                "VOTES_PER_PERIOD",
                votes_per_period.to_string(),
                "must not be negative",
            ));
        }

        let vote_refresh_days = parse_or(&lookup, "VOTE_REFRESH_DAYS", DEFAULT_REFRESH_DAYS)?;
        if vote_refresh_days < 1 {
            return Err(ConfigError::invalid(
                "VOTE_REFRESH_DAYS",
                vote_refresh_days.to_string(),
                "must be at least 1",
            ));
        }

        let reconcile_on_startup = parse_or(&lookup, "RECONCILE_ON_STARTUP", false)?;

        let origins = lookup("CORS_ORIGINS").unwrap_or_else(|| {
            info!("CORS_ORIGINS not set, using default: {DEFAULT_CORS_ORIGINS}");
            DEFAULT_CORS_ORIGINS.to_string()
        });
        let cors_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| HeaderValue::from_str(origin).map_err(|e| ConfigError::invalid("CORS_ORIGINS", origin, e)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            identity_header,
            catalog_url,
            votes_per_period,
            vote_refresh_days,
            reconcile_on_startup,
            cors_origins,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Quota rules derived from `VOTES_PER_PERIOD` and `VOTE_REFRESH_DAYS`.
    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy::new(self.votes_per_period, Duration::days(self.vote_refresh_days))
    }
}

/// Parses `key` with `T::from_str`, falling back to `default` when unset.
fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.parse().map_err(|e| ConfigError::invalid(key, value, e)),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/votes")])).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/votes");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.identity_header.as_str(), "x-user-email");
        assert_eq!(config.catalog_url, None);
        assert_eq!(config.quota_policy(), QuotaPolicy::default());
        assert!(!config.reconcile_on_startup);
        assert_eq!(config.cors_origins, vec![HeaderValue::from_static("http://localhost:3000")]);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/votes"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "9000"),
            ("IDENTITY_HEADER", "X-Forwarded-Email"),
            ("CATALOG_URL", "http://catalog/popular"),
            ("VOTES_PER_PERIOD", "3"),
            ("VOTE_REFRESH_DAYS", "7"),
            ("RECONCILE_ON_STARTUP", "true"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ]))
        .unwrap();

        assert_eq!(config.database_max_connections, 25);
        assert_eq!(config.socket_addr(), "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.identity_header.as_str(), "x-forwarded-email");
        assert_eq!(config.catalog_url.as_deref(), Some("http://catalog/popular"));
        assert_eq!(config.quota_policy(), QuotaPolicy::new(3, Duration::days(7)));
        assert!(config.reconcile_on_startup);
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_missing_database_url() {
        let result = ApiConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")]));

        assert_eq!(result.unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            ("SERVER_PORT", "http"),
            ("SERVER_HOST", "not-an-ip"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
            ("VOTES_PER_PERIOD", "-1"),
            ("VOTE_REFRESH_DAYS", "0"),
            ("RECONCILE_ON_STARTUP", "maybe"),
            ("IDENTITY_HEADER", "bad header"),
        ] {
            let result = ApiConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db"), (key, value)]));
            assert!(
                matches!(result, Err(ConfigError::Invalid { key: k, .. }) if k == key),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe {
            env::set_var("DATABASE_URL", "postgres://env/votes");
            env::set_var("SERVER_PORT", "8181");
        }

        let config = ApiConfig::from_env();

        unsafe {
            env::remove_var("DATABASE_URL");
            env::remove_var("SERVER_PORT");
        }

        let config = config.unwrap();
        assert_eq!(config.database_url, "postgres://env/votes");
        assert_eq!(config.port, 8181);
    }

    #[test]
    #[serial]
    fn test_from_env_without_database_url() {
        unsafe {
            env::remove_var("DATABASE_URL");
        }

        assert_eq!(ApiConfig::from_env().unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }
}
