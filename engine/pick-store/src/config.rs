//! Database configuration for PickStore

use crate::StoreError;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;

/// Database configuration
///
/// Either a full `url`, or the discrete libpq-style connection fields. The
/// fields are handed to sqlx as-is, so credentials need no URL escaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; wins over the discrete fields when set
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    /// Defaults to the user name, as libpq does
    pub database: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Require TLS; hosted databases reached through `DATABASE_URL` need it
    pub require_ssl: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: Some("localhost".to_string()),
            port: 5432,
            username: "postgres".to_string(),
            password: None,
            database: Some("pickem".to_string()),
            max_connections: 10,
            min_connections: 1,
            require_ssl: false,
        }
    }
}

impl DatabaseConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    ///
    /// `DATABASE_URL` wins when set; otherwise the connection comes from the
    /// libpq-style `PGUSER`, `PGPASSWORD`, `PGHOST`, `PGPORT` and `PGDATABASE`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut config = match lookup("DATABASE_URL") {
            Some(url) => Self { url: Some(url), require_ssl: true, ..defaults },
            None => {
                let host = lookup("PGHOST").ok_or_else(|| StoreError::InvalidConfig {
                    message: "DATABASE_URL or PGHOST must be set".to_string(),
                })?;
                let username = lookup("PGUSER").unwrap_or(defaults.username);
                Self {
                    url: None,
                    host: Some(host),
                    port: parse_number(&lookup, "PGPORT", defaults.port)?,
                    database: Some(lookup("PGDATABASE").unwrap_or_else(|| username.clone())),
                    username,
                    password: lookup("PGPASSWORD"),
                    require_ssl: false,
                    ..defaults
                }
            }
        };

        if let Some(value) = lookup("DATABASE_SSL") {
            config.require_ssl = parse_flag("DATABASE_SSL", &value)?;
        }
        config.max_connections =
            parse_number(&lookup, "DATABASE_MAX_CONNECTIONS", config.max_connections)?;
        config.min_connections =
            parse_number(&lookup, "DATABASE_MIN_CONNECTIONS", config.min_connections)?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), StoreError> {
        let has_url = self.url.as_deref().is_some_and(|url| !url.trim().is_empty());
        let has_host = self.host.as_deref().is_some_and(|host| !host.trim().is_empty());
        if !has_url && !has_host {
            return Err(StoreError::InvalidConfig {
                message: "database url or host must be set".to_string(),
            });
        }

        if self.max_connections == 0 {
            return Err(StoreError::InvalidConfig {
                message: "max_connections must be greater than 0".to_string(),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(StoreError::InvalidConfig {
                message: "min_connections cannot exceed max_connections".to_string(),
            });
        }

        Ok(())
    }

    /// Connection options for the pool
    pub fn connect_options(&self) -> Result<PgConnectOptions, StoreError> {
        let options = match (&self.url, &self.host) {
            (Some(url), _) => PgConnectOptions::from_str(url)?,
            (None, Some(host)) => {
                let mut options = PgConnectOptions::new()
                    .host(host)
                    .port(self.port)
                    .username(&self.username);
                if let Some(password) = &self.password {
                    options = options.password(password);
                }
                if let Some(database) = &self.database {
                    options = options.database(database);
                }
                options
            }
            (None, None) => {
                return Err(StoreError::InvalidConfig {
                    message: "database url or host must be set".to_string(),
                })
            }
        };
        Ok(if self.require_ssl { options.ssl_mode(PgSslMode::Require) } else { options })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, StoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| StoreError::InvalidConfig { message: format!("Invalid {}", key) }),
        None => Ok(default),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, StoreError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(StoreError::InvalidConfig { message: format!("Invalid {}", key) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_database_url_requires_ssl_by_default() {
        let config =
            DatabaseConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://u:p@db/pickem")]))
                .unwrap();
        assert_eq!(config.url.as_deref(), Some("postgres://u:p@db/pickem"));
        assert!(config.require_ssl);
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_connection_from_pg_vars() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            ("PGHOST", "localhost"),
            ("PGUSER", "pickem"),
            ("PGPASSWORD", "secret"),
            ("PGDATABASE", "league"),
            ("PGPORT", "6543"),
        ]))
        .unwrap();
        assert_eq!(config.url, None);
        assert_eq!(config.port, 6543);
        assert!(!config.require_ssl);

        let options = config.connect_options().unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "pickem");
        assert_eq!(options.get_database(), Some("league"));
    }

    #[test]
    fn test_password_with_url_delimiters_kept_out_of_host() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            ("PGHOST", "db.internal"),
            ("PGUSER", "app"),
            ("PGPASSWORD", "p@ss/word#1"),
            ("PGDATABASE", "pickem"),
        ]))
        .unwrap();
        assert_eq!(config.password.as_deref(), Some("p@ss/word#1"));

        let options = config.connect_options().unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("pickem"));
    }

    #[test]
    fn test_database_defaults_to_user_name() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            ("PGHOST", "localhost"),
            ("PGUSER", "pickem"),
        ]))
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("pickem"));
    }

    #[test]
    fn test_ssl_override() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/pickem"),
            ("DATABASE_SSL", "false"),
        ]))
        .unwrap();
        assert!(!config.require_ssl);
    }

    #[test]
    fn test_missing_host_rejected() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig { .. }));

        let config = DatabaseConfig { url: None, host: None, ..DatabaseConfig::default() };
        assert!(config.validate().is_err());
        assert!(config.connect_options().is_err());
    }

    #[test]
    fn test_invalid_pool_bounds_rejected() {
        let err = DatabaseConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/pickem"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_MIN_CONNECTIONS", "5"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("min_connections"));

        let err = DatabaseConfig::from_lookup(lookup_from(&[
            ("PGHOST", "localhost"),
            ("PGPORT", "70000"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PGPORT"));
    }

    #[test]
    fn test_connect_options_from_url() {
        let config = DatabaseConfig {
            url: Some("postgresql://postgres@db.example.com:5433/pickem".to_string()),
            require_ssl: true,
            ..DatabaseConfig::default()
        };
        let options = config.connect_options().unwrap();
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_host(), "db.example.com");
    }
}
