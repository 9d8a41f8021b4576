//! Type tags of the archive node layout.

/// Leading byte of every encoded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// No payload.
    Null = 0x00,
    /// Little-endian i16.
    Short = 0x02,
    /// Little-endian i32.
    Int = 0x03,
    /// Little-endian f32.
    Float = 0x04,
    /// Compact signed byte, or marker plus little-endian f64.
    Double = 0x05,
    /// Encrypted string.
    String = 0x08,
    /// Compressed child count, then the children.
    Map = 0x09,
    /// Two compressed i32 coordinates.
    Vector = 0x0A,
    /// Sub-format byte, compressed length, raw bytes.
    Blob = 0x0B,
    /// Encrypted path string.
    CrossRef = 0x0C,
    /// Little-endian i64.
    Long = 0x14,
}

impl Tag {
    /// Parse from a tag byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Null),
            0x02 => Some(Self::Short),
            0x03 => Some(Self::Int),
            0x04 => Some(Self::Float),
            0x05 => Some(Self::Double),
            0x08 => Some(Self::String),
            0x09 => Some(Self::Map),
            0x0A => Some(Self::Vector),
            0x0B => Some(Self::Blob),
            0x0C => Some(Self::CrossRef),
            0x14 => Some(Self::Long),
            _ => None,
        }
    }

    /// The tag byte.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
