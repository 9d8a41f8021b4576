//! Error type spanning every wzlib layer.

use thiserror::Error;

/// Errors surfaced by the wzlib facade.
#[derive(Debug, Error)]
pub enum Error {
    /// Byte-level error.
    #[error("{0}")]
    Common(#[from] wzlib_common::Error),

    /// Cipher or key error.
    #[error("{0}")]
    Crypto(#[from] wzlib_crypto::Error),

    /// Property tree or codec error.
    #[error("{0}")]
    Property(#[from] wzlib_property::Error),

    /// None of the known keys decrypts the expected root name.
    #[error("no known key decodes root name '{root_name}'")]
    UnknownKey { root_name: String },
}

/// Result type alias using the facade Error type.
pub type Result<T> = std::result::Result<T, Error>;
