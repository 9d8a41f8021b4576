//! Values carried by property nodes.
//!
//! Every node of a property tree holds exactly one [`PropertyValue`]. Map
//! nodes carry the [`PropertyValue::Map`] marker; their entries live in the
//! tree as child nodes.

use std::fmt;

use crate::Tag;

/// The value stored in a property node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    /// No value.
    Null,
    /// Signed 16-bit integer.
    Short(i16),
    /// Signed 32-bit integer.
    Int(i32),
    /// Signed 64-bit integer.
    Long(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Text.
    String(String),
    /// Integer 2D vector.
    Vector(Vector2D),
    /// Named children, held by the tree.
    Map,
    /// Opaque binary payload handed to an external decoder.
    Blob(Blob),
    /// Path to another node, resolved relative to the owner's parent.
    CrossRef(String),
}

/// An integer 2D vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector2D {
    pub x: i32,
    pub y: i32,
}

impl Vector2D {
    /// Create a new vector.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Sub-format of a blob payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlobFormat {
    /// Uninterpreted bytes.
    Raw,
    /// Audio stream.
    Sound,
    /// Packed bitmap.
    Canvas,
    /// Sub-format byte with no known meaning; preserved as is.
    Other(u8),
}

impl BlobFormat {
    /// Parse from the sub-format byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Raw,
            1 => Self::Sound,
            2 => Self::Canvas,
            n => Self::Other(n),
        }
    }

    /// The sub-format byte.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Raw => 0,
            Self::Sound => 1,
            Self::Canvas => 2,
            Self::Other(n) => n,
        }
    }
}

/// A binary payload together with its sub-format.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blob {
    pub format: BlobFormat,
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob.
    pub fn new(format: BlobFormat, data: impl Into<Vec<u8>>) -> Self {
        Self {
            format,
            data: data.into(),
        }
    }
}

impl PropertyValue {
    /// The tag this value is encoded with.
    pub fn tag(&self) -> Tag {
        match self {
            PropertyValue::Null => Tag::Null,
            PropertyValue::Short(_) => Tag::Short,
            PropertyValue::Int(_) => Tag::Int,
            PropertyValue::Long(_) => Tag::Long,
            PropertyValue::Float(_) => Tag::Float,
            PropertyValue::Double(_) => Tag::Double,
            PropertyValue::String(_) => Tag::String,
            PropertyValue::Vector(_) => Tag::Vector,
            PropertyValue::Map => Tag::Map,
            PropertyValue::Blob(_) => Tag::Blob,
            PropertyValue::CrossRef(_) => Tag::CrossRef,
        }
    }

    /// Check if this value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Check if this value is a map marker.
    #[inline]
    pub fn is_map(&self) -> bool {
        matches!(self, PropertyValue::Map)
    }

    /// Try to get this value as an i64, widening smaller integers.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PropertyValue::Short(v) => Some(i64::from(v)),
            PropertyValue::Int(v) => Some(i64::from(v)),
            PropertyValue::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get this value as an i32, widening shorts.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            PropertyValue::Short(v) => Some(i32::from(v)),
            PropertyValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get this value as an f64, widening floats.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PropertyValue::Float(v) => Some(f64::from(v)),
            PropertyValue::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a vector.
    pub fn as_vector(&self) -> Option<Vector2D> {
        match *self {
            PropertyValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get this value as a blob.
    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            PropertyValue::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get the path of a cross-reference.
    pub fn as_cross_ref(&self) -> Option<&str> {
        match self {
            PropertyValue::CrossRef(path) => Some(path),
            _ => None,
        }
    }
}

impl From<i16> for PropertyValue {
    fn from(v: i16) -> Self {
        PropertyValue::Short(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Long(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<Vector2D> for PropertyValue {
    fn from(v: Vector2D) -> Self {
        PropertyValue::Vector(v)
    }
}

impl From<Blob> for PropertyValue {
    fn from(v: Blob) -> Self {
        PropertyValue::Blob(v)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Short(v) => write!(f, "{}", v),
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Long(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Double(v) => write!(f, "{}", v),
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Vector(v) => write!(f, "({}, {})", v.x, v.y),
            PropertyValue::Map => write!(f, "Map"),
            PropertyValue::Blob(b) => write!(f, "Blob({:?}, {} bytes)", b.format, b.data.len()),
            PropertyValue::CrossRef(path) => write!(f, "Ref({})", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening() {
        assert_eq!(PropertyValue::Short(-3).as_i64(), Some(-3));
        assert_eq!(PropertyValue::Int(7).as_i64(), Some(7));
        assert_eq!(PropertyValue::Long(1 << 40).as_i32(), None);
        assert_eq!(PropertyValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(PropertyValue::from("x").as_i64(), None);
    }

    #[test]
    fn test_blob_format_bytes() {
        assert_eq!(BlobFormat::from_u8(1), BlobFormat::Sound);
        assert_eq!(BlobFormat::from_u8(9), BlobFormat::Other(9));
        assert_eq!(BlobFormat::Other(9).as_u8(), 9);
        assert_eq!(BlobFormat::Canvas.as_u8(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyValue::Vector(Vector2D::new(3, -4)).to_string(), "(3, -4)");
        assert_eq!(PropertyValue::CrossRef("../a".into()).to_string(), "Ref(../a)");
        assert_eq!(PropertyValue::Null.to_string(), "null");
    }
}
