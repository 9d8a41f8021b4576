//! Binary writer mirroring [`BinaryReader`](crate::BinaryReader).

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{Error, Result, StringLength, COMPRESSED_MARKER};

/// A binary writer that tracks how many bytes it has emitted.
///
/// # Example
///
/// ```
/// use wzlib_common::BinaryWriter;
///
/// let mut writer = BinaryWriter::new(Vec::new());
/// writer.write_compressed_i32(5)?;
/// writer.write_compressed_i32(1000)?;
/// assert_eq!(writer.into_inner(), vec![0x05, 0x80, 0xE8, 0x03, 0x00, 0x00]);
/// # Ok::<(), wzlib_common::Error>(())
/// ```
#[derive(Debug)]
pub struct BinaryWriter<W: Write> {
    inner: W,
    position: usize,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new writer over a sink.
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Consume the writer and return the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len();
        Ok(())
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        self.position += 1;
        Ok(())
    }

    /// Write a signed byte.
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.inner.write_i8(value)?;
        self.position += 1;
        Ok(())
    }

    /// Write a little-endian i16.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.inner.write_i16::<LittleEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    /// Write a little-endian u16.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u16::<LittleEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    /// Write a little-endian i32.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner.write_i32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a little-endian i64.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.inner.write_i64::<LittleEndian>(value)?;
        self.position += 8;
        Ok(())
    }

    /// Write a little-endian f32.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.inner.write_f32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a little-endian f64.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.inner.write_f64::<LittleEndian>(value)?;
        self.position += 8;
        Ok(())
    }

    /// Write a compressed i32, using the single-byte form whenever it fits.
    pub fn write_compressed_i32(&mut self, value: i32) -> Result<()> {
        match i8::try_from(value) {
            Ok(small) if small != COMPRESSED_MARKER => self.write_i8(small),
            _ => {
                self.write_i8(COMPRESSED_MARKER)?;
                self.write_i32(value)
            }
        }
    }

    /// Write a string length prefix.
    ///
    /// Lengths that do not fit the prefix byte are written as a marker
    /// followed by a full i32, matching what the reader accepts. Lengths
    /// beyond `i32::MAX` are rejected.
    pub fn write_string_length(&mut self, length: StringLength) -> Result<()> {
        match length {
            StringLength::Narrow(0) | StringLength::Wide(0) => self.write_i8(0),
            StringLength::Narrow(n) if n <= i8::MAX as usize => self.write_i8(-(n as i8)),
            StringLength::Narrow(n) => {
                let n = self.long_length(n)?;
                self.write_i8(COMPRESSED_MARKER)?;
                self.write_i32(n)
            }
            StringLength::Wide(n) if n < i8::MAX as usize => self.write_i8(n as i8),
            StringLength::Wide(n) => {
                let n = self.long_length(n)?;
                self.write_i8(i8::MAX)?;
                self.write_i32(n)
            }
        }
    }

    fn long_length(&self, n: usize) -> Result<i32> {
        i32::try_from(n).map_err(|_| Error::InvalidLength {
            length: i64::try_from(n).unwrap_or(i64::MAX),
            offset: self.position,
        })
    }
}
