//! Error types for property trees and their codec.

use thiserror::Error;

use crate::{BlobFormat, NodeId};

/// Errors that can occur when building, decoding or encoding property trees.
#[derive(Debug, Error)]
pub enum Error {
    /// Byte-level error (truncated buffer, bad length prefix, bad UTF-16).
    #[error("{0}")]
    Common(#[from] wzlib_common::Error),

    /// Cipher or key error.
    #[error("{0}")]
    Crypto(#[from] wzlib_crypto::Error),

    /// Type tag outside the recognized set.
    #[error("unknown type tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// Map nesting deeper than the configured limit.
    #[error("map nesting exceeds {limit} levels at offset {offset}")]
    DepthLimitExceeded { limit: usize, offset: usize },

    /// A path segment did not name an existing node.
    #[error("path not found: {path} (missing segment '{segment}')")]
    PathNotFound { path: String, segment: String },

    /// A sibling with the same name already exists.
    #[error("duplicate name '{name}' under '{parent}'")]
    DuplicateName { parent: String, name: String },

    /// Children can only be attached to map nodes.
    #[error("node '{name}' is not a map")]
    NotAContainer { name: String },

    /// Node is not a cross-reference.
    #[error("node '{name}' is not a cross-reference")]
    NotACrossReference { name: String },

    /// Node id does not refer to a live node of this tree.
    #[error("invalid node id {0}")]
    InvalidNode(NodeId),

    /// The tree has no slot index left for another node.
    #[error("tree is full ({slots} slots)")]
    TreeFull { slots: usize },

    /// A cloned tree shares structure with its source.
    #[error("clone integrity violation: {0}")]
    CloneIntegrityViolation(String),

    /// Blob sub-format the decoder cannot handle.
    #[error("unsupported blob format: {0:?}")]
    UnsupportedFormat(BlobFormat),

    /// Decoding stopped; carries the session version and cursor offset.
    #[error("decode failed at offset {offset} (version {version}): {source}")]
    Decode {
        version: i16,
        offset: usize,
        source: Box<Error>,
    },
}

impl Error {
    /// The underlying error, with any decode-session wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Decode { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the error came from a buffer that ended too early.
    pub fn is_truncated(&self) -> bool {
        matches!(
            self.root(),
            Error::Common(wzlib_common::Error::TruncatedBuffer { .. })
        )
    }
}

/// Result type for property operations.
pub type Result<T> = std::result::Result<T, Error>;
