use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::ConfigError;

/// Upper bound on a single database connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Server configuration, loaded from environment variables.
///
/// Database connection settings:
/// - `DB_HOST` (optional, default: postgres-service2) - Database hostname
/// - `DB_PORT` (optional, default: 5432) - Database port
/// - `DB_NAME` (optional, default: service2_db) - Database name
/// - `DB_USER` (required) - Database username
/// - `DB_PASSWORD` (required) - Database password
///
/// Listener settings:
/// - `SERVICE_HOST` (optional, default: 0.0.0.0)
/// - `SERVICE_PORT` (optional, default: 5002)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database: DatabaseConfig,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
}

// Keeps the password out of logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig {
            host: lookup("DB_HOST").unwrap_or_else(|| "postgres-service2".to_string()),
            port: parse_or("DB_PORT", lookup("DB_PORT"), 5432)?,
            name: lookup("DB_NAME").unwrap_or_else(|| "service2_db".to_string()),
            user: require("DB_USER", lookup("DB_USER"))?,
            password: require("DB_PASSWORD", lookup("DB_PASSWORD"))?,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        };

        let host: IpAddr = parse_or(
            "SERVICE_HOST",
            lookup("SERVICE_HOST"),
            IpAddr::from([0, 0, 0, 0]),
        )?;
        let port: u16 = parse_or("SERVICE_PORT", lookup("SERVICE_PORT"), 5002)?;

        Ok(Self {
            bind: SocketAddr::from((host, port)),
            database,
        })
    }
}

fn require(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DB_USER", "service2_user"),
            ("DB_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.database.host, "postgres-service2");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "service2_db");
        assert_eq!(config.database.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.bind, "0.0.0.0:5002".parse().unwrap());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "diagnostics"),
            ("DB_USER", "u"),
            ("DB_PASSWORD", "p"),
            ("SERVICE_HOST", "127.0.0.1"),
            ("SERVICE_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.name, "diagnostics");
        assert_eq!(config.bind, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("DB_PASSWORD", "p")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DB_USER")));

        let err = ServerConfig::from_lookup(lookup_from(&[("DB_USER", "u"), ("DB_PASSWORD", "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DB_PASSWORD")));
    }

    #[test]
    fn malformed_port_is_reported_with_its_value() {
        let err = ServerConfig::from_lookup(lookup_from(&[
            ("DB_USER", "u"),
            ("DB_PASSWORD", "p"),
            ("DB_PORT", "postgres"),
        ]))
        .unwrap_err();

        match err {
            ConfigError::Invalid { key, value } => {
                assert_eq!(key, "DB_PORT");
                assert_eq!(value, "postgres");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn debug_output_hides_password() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DB_USER", "u"),
            ("DB_PASSWORD", "hunter2"),
        ]))
        .unwrap();

        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
