//! wzlib - archive property trees and the packet cipher of a classic MMO client.
//!
//! This crate provides a unified interface to the wzlib crates.
//!
//! # Crates
//!
//! - [`wzlib_common`] - Binary reading and writing, compressed integers, string prefixes
//! - [`wzlib_crypto`] - IV shuffle, AES output-feedback cipher, packet headers, archive keys
//! - [`wzlib_property`] - Property tree model and its binary codec
//!
//! # Example
//!
//! ```
//! use wzlib::prelude::*;
//!
//! let tree = PropertyBuilder::map("Property")
//!     .child(PropertyBuilder::new("speed", 120))
//!     .build()?;
//!
//! let mut codec = TreeCodec::new(ArchiveKeyContext::for_variant(KeyVariant::Global));
//! let bytes = codec.encode(&tree)?;
//!
//! // the key is unknown to the reader, but the root name is
//! let (variant, decoded) = wzlib::decode_image(&bytes, "Property")?;
//! assert_eq!(variant, KeyVariant::Global);
//! assert_eq!(decoded.root_node().get_i32("speed"), Some(120));
//! # Ok::<(), wzlib::Error>(())
//! ```

mod error;
mod image;

pub use wzlib_common as common;
pub use wzlib_crypto as crypto;
pub use wzlib_property as property;

pub use error::{Error, Result};
pub use image::{decode_image, detect_variant};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use wzlib_common::{BinaryReader, BinaryWriter};
    pub use wzlib_crypto::{packet_length, ArchiveKeyContext, BaseKey, CipherState, KeyVariant};
    pub use wzlib_property::{
        Blob, BlobDecoder, BlobFormat, CodecOptions, NodeId, PropertyBuilder, PropertyTree,
        PropertyValue, TreeCodec, Vector2D,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
