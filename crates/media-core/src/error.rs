use thiserror::Error;

/// Result type for media operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for media operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration value out of its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from the RTP layer
    #[error("RTP error: {0}")]
    Rtp(#[from] pbx_rtp_core::Error),

    /// Error from shared infrastructure (config loading, logging)
    #[error(transparent)]
    Infra(#[from] pbx_infra_common::Error),
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }
}
