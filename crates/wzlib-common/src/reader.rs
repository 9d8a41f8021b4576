//! Binary reader over in-memory archive buffers.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads
//! archive primitives from a byte slice without copying.

use crate::{Error, Result, COMPRESSED_MARKER};

/// Largest length a single-byte prefix can carry for a UTF-16 string.
const WIDE_MARKER: i8 = i8::MAX;

/// Decoded length prefix of an archive string.
///
/// Archive strings are stored either as single-byte characters or as UTF-16
/// code units. The sign of the first prefix byte selects the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringLength {
    /// `n` single-byte characters follow. An empty string is `Narrow(0)`.
    Narrow(usize),
    /// `n` UTF-16 code units (`2 * n` bytes) follow.
    Wide(usize),
}

impl StringLength {
    /// Number of payload bytes that follow the prefix.
    #[inline]
    pub fn byte_len(&self) -> Option<usize> {
        match *self {
            StringLength::Narrow(n) => Some(n),
            StringLength::Wide(n) => n.checked_mul(2),
        }
    }

    /// Check if the prefix describes an empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, StringLength::Narrow(0) | StringLength::Wide(0))
    }
}

/// A binary reader over a byte slice.
///
/// The reader keeps an absolute position so that every error can report
/// the offset at which decoding stopped.
///
/// # Example
///
/// ```
/// use wzlib_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x80, 0x10, 0x27, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_compressed_i32().unwrap(), 10_000);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::TruncatedBuffer {
                needed: count,
                available: self.remaining(),
                offset: self.position,
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Read a little-endian i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_array().map(i16::from_le_bytes)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian i64.
    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    /// Read a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read a little-endian f64.
    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Read a compressed i32.
    ///
    /// A single signed byte holds the value unless it is `-128`, in which
    /// case a full little-endian i32 follows.
    pub fn read_compressed_i32(&mut self) -> Result<i32> {
        let small = self.read_i8()?;
        if small == COMPRESSED_MARKER {
            self.read_i32()
        } else {
            Ok(i32::from(small))
        }
    }

    /// Read a compressed, non-negative length and check it fits the buffer.
    pub fn read_compressed_len(&mut self) -> Result<usize> {
        let offset = self.position;
        let length = self.read_compressed_i32()?;
        let length = usize::try_from(length).map_err(|_| Error::InvalidLength {
            length: i64::from(length),
            offset,
        })?;
        if length > self.remaining() {
            return Err(Error::TruncatedBuffer {
                needed: length,
                available: self.remaining(),
                offset: self.position,
            });
        }
        Ok(length)
    }

    /// Read the length prefix of an archive string.
    ///
    /// Positive prefixes announce UTF-16 code units (`127` means an i32
    /// length follows), negative prefixes announce single-byte characters
    /// (`-128` means an i32 length follows), zero is the empty string.
    pub fn read_string_length(&mut self) -> Result<StringLength> {
        let offset = self.position;
        let small = self.read_i8()?;

        let length = match small {
            0 => return Ok(StringLength::Narrow(0)),
            WIDE_MARKER | COMPRESSED_MARKER => i64::from(self.read_i32()?),
            n => i64::from(n).abs(),
        };

        let count = usize::try_from(length).map_err(|_| Error::InvalidLength { length, offset })?;
        let prefix = if small > 0 {
            StringLength::Wide(count)
        } else {
            StringLength::Narrow(count)
        };

        let needed = prefix
            .byte_len()
            .ok_or(Error::InvalidLength { length, offset })?;
        if needed > self.remaining() {
            return Err(Error::TruncatedBuffer {
                needed,
                available: self.remaining(),
                offset: self.position,
            });
        }

        Ok(prefix)
    }
}
