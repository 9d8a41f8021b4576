//! Error types for wzlib-common.

use thiserror::Error;

/// Common error type for wzlib byte-level operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A read or a length prefix reached past the end of the buffer.
    #[error("truncated buffer at offset {offset}: needed {needed} bytes but only {available} available")]
    TruncatedBuffer {
        needed: usize,
        available: usize,
        offset: usize,
    },

    /// A length prefix decoded to a negative or unrepresentable value.
    #[error("invalid length {length} at offset {offset}")]
    InvalidLength { length: i64, offset: usize },

    /// A UTF-16 payload contained an unpaired surrogate.
    #[error("invalid UTF-16 string at offset {offset}")]
    Utf16 { offset: usize },

    /// I/O error from the underlying writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
