//! Server configuration
//!
//! Resolved once at startup from environment variables:
//!
//! - `ORGCHART_DB_PATH`: database file (default `~/.orgchart/database/orgchart.db`)
//! - `ORGCHART_HOST`: bind address (default `127.0.0.1`)
//! - `ORGCHART_PORT`: bind port (default `3100`)
//! - `CORS_ALLOW_ORIGIN`: single allowed browser origin (default: any)

use axum::http::HeaderValue;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to get home directory")]
    NoHomeDirectory,

    #[error("Invalid {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Database path must not be empty")]
    EmptyDatabasePath,

    #[error("Port must not be 0")]
    ZeroPort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    /// Build from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup("ORGCHART_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let host = lookup("ORGCHART_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("ORGCHART_PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                var: "ORGCHART_PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let config = Self {
            database_path,
            host,
            port,
            cors_allow_origin: lookup("CORS_ALLOW_ORIGIN"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if let Some(origin) = &self.cors_allow_origin {
            if origin.parse::<HeaderValue>().is_err() {
                return Err(ConfigError::InvalidValue {
                    var: "CORS_ALLOW_ORIGIN",
                    value: origin.clone(),
                });
            }
        }
        Ok(())
    }

    /// `host:port` for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Default: ~/.orgchart/database/orgchart.db
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home_dir
        .join(".orgchart")
        .join("database")
        .join("orgchart.db"))
}
