use thiserror::Error;

/// Result type for RTP core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by RTP core configuration
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration value out of its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }
}
