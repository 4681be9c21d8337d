//! Error types for the client binary.

/// Top-level error for the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid environment configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connecting, reading or writing failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
