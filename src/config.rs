use std::env;
use std::fmt;
use std::num::ParseIntError;

use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

const DEFAULT_APP_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {name} is not a valid port ({value:?}): {source}")]
    InvalidPort {
        name: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub database_host: String,
    pub database_port: u16,
    pub database_user: String,
    pub database_password: String,
    pub database_name: String,
    pub app_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_port = parse_port("DATABASE_PORT", required("DATABASE_PORT")?)?;
        let app_port = match lookup("APP_PORT").filter(|value| !value.is_empty()) {
            Some(value) => parse_port("APP_PORT", value)?,
            None => DEFAULT_APP_PORT,
        };

        Ok(Self {
            database_host: required("DATABASE_HOST")?,
            database_port,
            database_user: required("DATABASE_USER")?,
            // An empty password is legitimate for trust-authenticated servers.
            database_password: lookup("DATABASE_PASSWORD")
                .ok_or(ConfigError::Missing("DATABASE_PASSWORD"))?,
            database_name: required("DATABASE_NAME")?,
            app_port,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.database_host)
            .port(self.database_port)
            .username(&self.database_user)
            .password(&self.database_password)
            .database(&self.database_name)
            .ssl_mode(PgSslMode::Disable)
    }

    pub fn bind_addr(&self) -> (&'static str, u16) {
        ("0.0.0.0", self.app_port)
    }

    /// Connection description safe to write to the log.
    pub fn redacted(&self) -> String {
        format!(
            "host={} port={} user={} password=*** dbname={} sslmode=disable",
            self.database_host, self.database_port, self.database_user, self.database_name
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_host", &self.database_host)
            .field("database_port", &self.database_port)
            .field("database_user", &self.database_user)
            .field("database_password", &"***")
            .field("database_name", &self.database_name)
            .field("app_port", &self.app_port)
            .finish()
    }
}

fn parse_port(name: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::InvalidPort { name, value, source })
}
