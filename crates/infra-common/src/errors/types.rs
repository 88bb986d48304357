use std::io;
use thiserror::Error;

/// Result type for infrastructure operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting up logging or loading configuration
#[derive(Debug, Error)]
pub enum Error {
    /// Reading a configuration file failed
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A configuration file could not be parsed
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// A configuration value is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The global subscriber was already installed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl Error {
    /// Create a configuration error from any message
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}
