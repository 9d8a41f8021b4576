//! Error types for the crypto crate.

use thiserror::Error;

/// Errors that can occur in the cipher and header codec.
#[derive(Debug, Error)]
pub enum Error {
    /// Packet header shorter than the fixed header size.
    #[error("malformed packet header: expected at least {expected} bytes, got {length}")]
    MalformedHeader { expected: usize, length: usize },

    /// Incoming packet prefix does not match the session version.
    #[error("version mismatch: expected {expected}, packet carries {actual}")]
    VersionMismatch { expected: i16, actual: i16 },

    /// Key material of the wrong size.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, Error>;
