//! Process settings loaded from environment variables (after `.env`, if present).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;

/// | Env var                    | Default                       |
/// |----------------------------|-------------------------------|
/// | `DATABASE_URL`             | `postgres://localhost/movies` |
/// | `HOST`                     | `0.0.0.0`                     |
/// | `PORT`                     | `3000`                        |
/// | `DATABASE_MAX_CONNECTIONS` | `5`                           |
/// | `BODY_LIMIT_BYTES`         | `1048576`                     |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/movies".into(),
            host: "0.0.0.0".into(),
            port: 3000,
            max_connections: 5,
            body_limit: 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Settings::default();
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or(d.database_url),
            host: lookup("HOST").unwrap_or(d.host),
            port: parse_var(&lookup, "PORT", d.port)?,
            max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", d.max_connections)?,
            body_limit: parse_var(&lookup, "BODY_LIMIT_BYTES", d.body_limit)?,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidVar { name: "HOST", value: raw })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name, value }),
        None => Ok(default),
    }
}
