// Error taxonomy shared by the dispatcher, the reporter and the Gremlin
// client. The binary turns these into `anyhow` reports at the top level.

use crate::api::StatusAttributes;
use crate::config::ConfigError;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed startup value.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The menu selection could not be read as a number.
    #[error("Invalid selection: {0}")]
    Input(String),

    /// The service answered with a non-success status code.
    #[error("Request failed with status {code}: {message}")]
    Service {
        code: u16,
        message: String,
        attributes: StatusAttributes,
    },

    /// WebSocket connect, send or receive failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A frame that does not follow the Gremlin response format.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Status code carried by a service error, if this is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Service { code, .. } => Some(*code),
            _ => None,
        }
    }
}
