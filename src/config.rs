// Startup configuration. Values come from the process environment and are
// validated once; everything downstream receives a `Config` value instead of
// reading the environment itself.

use std::fmt;
use thiserror::Error;

/// Database and container identifiers that make up the namespace path.
pub const DATABASE: &str = "graphmas";
pub const CONTAINER: &str = "holidays";

pub const DEFAULT_PORT: u16 = 443;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing env var: {0}")]
    Missing(&'static str),
    #[error("Invalid env var: EnableSSL is not a boolean ({0:?})")]
    InvalidBool(String),
    #[error("Invalid env var: Port is not an integer ({0:?})")]
    InvalidPort(String),
}

/// Connection settings for the graph service.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub enable_ssl: bool,
    /// Primary key, sent as the SASL password. Never printed.
    pub primary_key: String,
    pub database: String,
    pub container: String,
}

impl Config {
    /// Build the configuration from the process environment (`Host`,
    /// `PrimaryKey`, `Port`, `EnableSSL`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary lookup function.
    ///
    /// Required values that are blank count as missing. Optional values fall
    /// back to their default only when unset; a blank one is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let host = required("Host")?;
        let primary_key = required("PrimaryKey")?;

        let port = match lookup("Port") {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
        };

        let enable_ssl = match lookup("EnableSSL") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidBool(raw))?,
        };

        Ok(Config {
            host: host.trim().to_string(),
            port,
            enable_ssl,
            primary_key,
            database: DATABASE.to_string(),
            container: CONTAINER.to_string(),
        })
    }

    /// `/dbs/<database>/colls/<container>`, used as the SASL username.
    pub fn namespace_path(&self) -> String {
        format!("/dbs/{}/colls/{}", self.database, self.container)
    }

    /// WebSocket endpoint for the configured host.
    pub fn endpoint(&self) -> String {
        let scheme = if self.enable_ssl { "wss" } else { "ws" };
        format!("{}://{}:{}/", scheme, self.host, self.port)
    }

    /// One-line connection summary printed at startup.
    pub fn summary(&self) -> String {
        format!(
            "Connecting to: host: {}, port: {}, container: {}, ssl: {}",
            self.host,
            self.port,
            self.namespace_path(),
            self.enable_ssl
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("enable_ssl", &self.enable_ssl)
            .field("primary_key", &"<redacted>")
            .field("database", &self.database)
            .field("container", &self.container)
            .finish()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
