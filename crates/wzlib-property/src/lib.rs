//! Property trees stored in wzlib archives.
//!
//! An archive image is a tree of named, typed nodes: integers, floats,
//! strings, 2D vectors, nested maps, opaque blobs and cross-references to
//! other nodes by path. This crate models that tree and reads and writes its
//! binary form.
//!
//! - [`PropertyTree`] - Arena-backed tree with parent links, editing and deep cloning
//! - [`PropertyBuilder`] - Owned description of a subtree, for literals
//! - [`TreeCodec`] - Binary decoder and encoder bound to one key session
//! - [`BlobDecoder`] - Hook for turning blob payloads into usable assets
//!
//! # Example
//!
//! ```
//! use wzlib_crypto::{ArchiveKeyContext, KeyVariant};
//! use wzlib_property::{PropertyBuilder, PropertyValue, TreeCodec};
//!
//! let tree = PropertyBuilder::map("Mob.img")
//!     .child(PropertyBuilder::map("stand").child(PropertyBuilder::vector("origin", 30, 62)))
//!     .child(PropertyBuilder::cross_ref("hit", "stand"))
//!     .build()?;
//!
//! let mut codec = TreeCodec::new(ArchiveKeyContext::for_variant(KeyVariant::Europe));
//! let bytes = codec.encode(&tree)?;
//! let decoded = codec.decode(&bytes)?;
//!
//! let hit = decoded.find("hit")?;
//! let stand = decoded.resolve_cross_reference(hit)?;
//! assert_eq!(decoded.node(stand).and_then(|n| n.get_vector("origin")).map(|v| v.x), Some(30));
//! assert!(matches!(decoded.value(stand), Some(PropertyValue::Map)));
//! # Ok::<(), wzlib_property::Error>(())
//! ```

mod blob;
mod builder;
mod codec;
mod error;
mod path;
mod strings;
mod tag;
mod tree;
mod value;

pub use blob::BlobDecoder;
pub use builder::PropertyBuilder;
pub use codec::{CodecOptions, TreeCodec, DEFAULT_MAX_DEPTH};
pub use error::{Error, Result};
pub use strings::{read_string, write_string};
pub use tag::Tag;
pub use tree::{Descendants, Node, NodeId, PropertyTree};
pub use value::{Blob, BlobFormat, PropertyValue, Vector2D};
