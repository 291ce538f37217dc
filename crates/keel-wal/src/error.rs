use std::fmt::Display;

/// A specialized error type for log write-path operations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum WalError {
    /// An I/O error surfaced by the sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An internal invariant was violated, or the sink observed bytes that
    /// do not match their handoff checksum.
    #[error("data corruption: {0}")]
    Corruption(String),
    /// The sink does not support the requested operation.
    #[error("not supported: {0}")]
    NotSupported(String),
    /// Configuration value was invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The writer was closed and its sink handle released.
    #[error("writer is closed")]
    Closed,
}

impl WalError {
    /// Create a corruption error from a displayable value.
    pub fn corruption<T>(msg: T) -> Self
    where
        T: Display,
    {
        Self::Corruption(msg.to_string())
    }

    /// Create a not-supported error from a displayable value.
    pub fn not_supported<T>(msg: T) -> Self
    where
        T: Display,
    {
        Self::NotSupported(msg.to_string())
    }

    /// Create an invalid configuration error from a displayable value.
    pub fn invalid_config<T>(msg: T) -> Self
    where
        T: Display,
    {
        Self::InvalidConfig(msg.to_string())
    }
}

/// A Result type alias for log write-path operations.
pub type WalResult<T> = Result<T, WalError>;
