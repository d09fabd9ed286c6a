//! Error types for the dummy flash

use thiserror::Error;

/// Dummy flash specific errors
#[derive(Debug, Error)]
pub enum DummyError {
    /// Failed to read or write the image file
    #[error("image file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Image file does not start with the expected header
    #[error("'{0}' is not a flash image")]
    BadMagic(String),

    /// Image holds no flash contents
    #[error("'{0}' holds no flash contents")]
    Empty(String),

    /// Header size and payload length disagree
    #[error("image declares {declared} bytes but holds {actual}")]
    SizeMismatch { declared: u32, actual: usize },

    /// Invalid option value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for dummy flash operations
pub type Result<T> = std::result::Result<T, DummyError>;
