//! Error types for the nightsync daemon.

/// Main error type for daemon setup.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// HTTP client could not be built.
    #[error("client error: {0}")]
    Client(#[from] sgv_client::TransportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for daemon operations.
pub type Result<T> = std::result::Result<T, RelayError>;
