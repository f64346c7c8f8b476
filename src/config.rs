use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::secrets::{self, SecretSource};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to read secret file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed secret: {0}")]
    Json(#[from] serde_json::Error),

    #[error("secret endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Settings resolved once at startup and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub cors_origins: Vec<String>,
    pub bind_addr: SocketAddr,
    pub secret_source: SecretSource,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            acquire_timeout_secs: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
        };

        let cors_origins = match lookup("FRONTEND_URL") {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            _ => {
                warn!("FRONTEND_URL not set, using default origins for development");
                DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect()
            }
        };

        let host: IpAddr = parse_or(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port: u16 = parse_or(&lookup, "PORT", 5000)?;

        let secret_source = match lookup("SECRET_SOURCE").as_deref() {
            None | Some("env") => SecretSource::Env,
            Some("file") => SecretSource::File(PathBuf::from(
                lookup("DB_SECRET_FILE").ok_or(ConfigError::Missing("DB_SECRET_FILE"))?,
            )),
            Some("http") => SecretSource::Http {
                url: lookup("DB_SECRET_URL").ok_or(ConfigError::Missing("DB_SECRET_URL"))?,
                token: lookup("DB_SECRET_TOKEN"),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SECRET_SOURCE",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            database,
            cors_origins,
            bind_addr: SocketAddr::new(host, port),
            secret_source,
        })
    }

    /// Reads the environment and resolves database credentials from the
    /// configured secret source.
    pub async fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_env()?;
        config.resolve_secrets().await?;
        Ok(config)
    }

    pub async fn resolve_secrets(&mut self) -> Result<(), ConfigError> {
        let provider = secrets::provider_for(&self.secret_source)?;
        let secret = provider.database_secret().await?;
        if let Some(url) = secret.database_url {
            info!(source = provider.name(), "database url resolved from secret store");
            self.database.url = url;
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.cors_origins, DEFAULT_ORIGINS);
        assert_eq!(config.bind_addr.port(), 5000);
        assert!(matches!(config.secret_source, SecretSource::Env));
    }

    #[test]
    fn frontend_url_accepts_a_list() {
        let config = config_from(&[(
            "FRONTEND_URL",
            "https://todo.example.com, http://localhost:5173",
        )])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            ["https://todo.example.com", "http://localhost:5173"]
        );
    }

    #[test]
    fn bad_port_is_reported() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn file_source_needs_a_path() {
        let err = config_from(&[("SECRET_SOURCE", "file")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DB_SECRET_FILE")));
    }

    #[test]
    fn unknown_secret_source_is_rejected() {
        let err = config_from(&[("SECRET_SOURCE", "vault")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SECRET_SOURCE", .. }));
    }
}
