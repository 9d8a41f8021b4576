//! Binary codec for property trees.
//!
//! Every node is encoded as its tag byte, its encrypted name, then a
//! tag-specific payload. Map payloads are a compressed child count followed
//! by the children, so a whole tree is one contiguous node.
//!
//! Decoding stops at the first malformed node: a bad tag or length leaves the
//! cursor out of step with every following sibling, so nothing after it can
//! be trusted.

use std::io::Write;

use tracing::{debug, trace, warn};
use wzlib_common::{BinaryReader, BinaryWriter, COMPRESSED_MARKER};
use wzlib_crypto::ArchiveKeyContext;

use crate::strings::{read_string, write_string};
use crate::{Blob, BlobFormat, Error, NodeId, PropertyTree, PropertyValue, Result, Tag, Vector2D};

/// Default limit on map nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Tunables for [`TreeCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecOptions {
    /// Deepest node accepted by the decoder. The root is depth 0.
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What follows a node's name: either a finished value or a child count.
enum Payload {
    Value(PropertyValue),
    Map(usize),
}

/// Decoder and encoder for one archive session.
///
/// The codec owns the session's [`ArchiveKeyContext`], so the string
/// keystream is derived once and reused for every node.
///
/// # Example
///
/// ```
/// use wzlib_crypto::{ArchiveKeyContext, KeyVariant};
/// use wzlib_property::{PropertyBuilder, TreeCodec};
///
/// let tree = PropertyBuilder::map("root")
///     .child(PropertyBuilder::new("hp", 100))
///     .build()?;
///
/// let mut codec = TreeCodec::new(ArchiveKeyContext::for_variant(KeyVariant::Global));
/// let bytes = codec.encode(&tree)?;
/// assert_eq!(codec.decode(&bytes)?, tree);
/// # Ok::<(), wzlib_property::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TreeCodec {
    context: ArchiveKeyContext,
    options: CodecOptions,
}

impl TreeCodec {
    /// Create a codec with default options.
    pub fn new(context: ArchiveKeyContext) -> Self {
        Self {
            context,
            options: CodecOptions::default(),
        }
    }

    /// Replace the codec options.
    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    /// Key context of this session.
    pub fn context(&self) -> &ArchiveKeyContext {
        &self.context
    }

    /// Options of this session.
    pub fn options(&self) -> CodecOptions {
        self.options
    }

    /// Decode one tree from the start of `data`.
    ///
    /// Trailing bytes after the root node are ignored.
    pub fn decode(&mut self, data: &[u8]) -> Result<PropertyTree> {
        let mut reader = BinaryReader::new(data);
        let tree = self.decode_from(&mut reader)?;
        if !reader.is_empty() {
            debug!(trailing = reader.remaining(), "bytes left after root node");
        }
        Ok(tree)
    }

    /// Decode one tree at the reader's position, leaving it after the root.
    ///
    /// Errors are wrapped in [`Error::Decode`] with the session version and
    /// the offset at which decoding stopped.
    pub fn decode_from(&mut self, reader: &mut BinaryReader<'_>) -> Result<PropertyTree> {
        let start = reader.position();
        self.read_tree(reader).map_err(|source| {
            let offset = reader.position();
            warn!(version = self.context.version(), start, offset, error = %source, "decode failed");
            Error::Decode {
                version: self.context.version(),
                offset,
                source: Box::new(source),
            }
        })
    }

    fn read_tree(&mut self, reader: &mut BinaryReader<'_>) -> Result<PropertyTree> {
        let (name, payload) = self.read_entry(reader)?;
        let tree = match payload {
            Payload::Value(value) => PropertyTree::new(name, value),
            Payload::Map(count) => {
                let mut tree = PropertyTree::new_map(name);
                let root = tree.root();
                self.read_children(reader, &mut tree, root, count, 1)?;
                tree
            }
        };
        trace!(nodes = tree.node_count(), end = reader.position(), "decoded tree");
        tree.verify_integrity()?;
        Ok(tree)
    }

    fn read_children(
        &mut self,
        reader: &mut BinaryReader<'_>,
        tree: &mut PropertyTree,
        parent: NodeId,
        count: usize,
        depth: usize,
    ) -> Result<()> {
        if count > 0 && depth > self.options.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: self.options.max_depth,
                offset: reader.position(),
            });
        }

        for _ in 0..count {
            let (name, payload) = self.read_entry(reader)?;
            match payload {
                Payload::Value(value) => {
                    tree.add_child(parent, name, value)?;
                }
                Payload::Map(count) => {
                    let id = tree.add_child(parent, name, PropertyValue::Map)?;
                    self.read_children(reader, tree, id, count, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn read_entry(&mut self, reader: &mut BinaryReader<'_>) -> Result<(String, Payload)> {
        let offset = reader.position();
        let byte = reader.read_u8()?;
        let tag = Tag::from_u8(byte).ok_or(Error::UnknownTag { tag: byte, offset })?;
        let name = read_string(reader, &mut self.context)?;

        let value = match tag {
            Tag::Null => PropertyValue::Null,
            Tag::Short => PropertyValue::Short(reader.read_i16()?),
            Tag::Int => PropertyValue::Int(reader.read_i32()?),
            Tag::Long => PropertyValue::Long(reader.read_i64()?),
            Tag::Float => PropertyValue::Float(reader.read_f32()?),
            Tag::Double => match reader.read_i8()? {
                COMPRESSED_MARKER => PropertyValue::Double(reader.read_f64()?),
                small => PropertyValue::Double(f64::from(small)),
            },
            Tag::String => PropertyValue::String(read_string(reader, &mut self.context)?),
            Tag::Vector => {
                let x = reader.read_compressed_i32()?;
                let y = reader.read_compressed_i32()?;
                PropertyValue::Vector(Vector2D::new(x, y))
            }
            Tag::Blob => {
                let format = BlobFormat::from_u8(reader.read_u8()?);
                let len = reader.read_compressed_len()?;
                PropertyValue::Blob(Blob::new(format, reader.read_bytes(len)?))
            }
            Tag::CrossRef => PropertyValue::CrossRef(read_string(reader, &mut self.context)?),
            Tag::Map => {
                // every child takes at least two bytes, so a count larger
                // than the remaining buffer is already known to be truncated
                let count = reader.read_compressed_len()?;
                trace!(offset, %name, count, "map");
                return Ok((name, Payload::Map(count)));
            }
        };

        trace!(offset, %name, ?tag, "node");
        Ok((name, Payload::Value(value)))
    }

    /// Encode a whole tree.
    pub fn encode(&mut self, tree: &PropertyTree) -> Result<Vec<u8>> {
        self.encode_node(tree, tree.root())
    }

    /// Encode the subtree under `id` as a standalone node.
    pub fn encode_node(&mut self, tree: &PropertyTree, id: NodeId) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::new(Vec::new());
        self.encode_into(tree, id, &mut writer)?;
        Ok(writer.into_inner())
    }

    /// Encode the subtree under `id` into an existing writer.
    pub fn encode_into<W: Write>(
        &mut self,
        tree: &PropertyTree,
        id: NodeId,
        writer: &mut BinaryWriter<W>,
    ) -> Result<()> {
        let node = tree.node(id).ok_or(Error::InvalidNode(id))?;
        let value = node.value();

        writer.write_u8(value.tag().as_u8())?;
        write_string(writer, &mut self.context, node.name())?;

        match value {
            PropertyValue::Null => {}
            PropertyValue::Short(v) => writer.write_i16(*v)?,
            PropertyValue::Int(v) => writer.write_i32(*v)?,
            PropertyValue::Long(v) => writer.write_i64(*v)?,
            PropertyValue::Float(v) => writer.write_f32(*v)?,
            PropertyValue::Double(v) => write_double(writer, *v)?,
            PropertyValue::String(s) => write_string(writer, &mut self.context, s)?,
            PropertyValue::Vector(v) => {
                writer.write_compressed_i32(v.x)?;
                writer.write_compressed_i32(v.y)?;
            }
            PropertyValue::Blob(blob) => {
                writer.write_u8(blob.format.as_u8())?;
                writer.write_compressed_i32(encoded_len(blob.data.len(), writer.position())?)?;
                writer.write_bytes(&blob.data)?;
            }
            PropertyValue::CrossRef(path) => write_string(writer, &mut self.context, path)?,
            PropertyValue::Map => {
                writer.write_compressed_i32(encoded_len(node.child_count(), writer.position())?)?;
                for child in node.children() {
                    self.encode_into(tree, child.id(), writer)?;
                }
            }
        }
        Ok(())
    }
}

fn encoded_len(len: usize, offset: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        wzlib_common::Error::InvalidLength {
            length: i64::try_from(len).unwrap_or(i64::MAX),
            offset,
        }
        .into()
    })
}

/// Doubles that are small integers take a single byte; everything else is
/// the marker followed by the full value.
fn write_double<W: Write>(writer: &mut BinaryWriter<W>, value: f64) -> Result<()> {
    let compact = value.fract() == 0.0
        && (-127.0..=127.0).contains(&value)
        && !(value == 0.0 && value.is_sign_negative());
    if compact {
        writer.write_i8(value as i8)?;
    } else {
        writer.write_i8(COMPRESSED_MARKER)?;
        writer.write_f64(value)?;
    }
    Ok(())
}
