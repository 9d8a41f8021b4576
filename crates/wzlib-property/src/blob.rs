//! Hook for external blob decoders.
//!
//! Blob payloads (sounds, bitmaps) are carried through the tree untouched.
//! Turning them into something playable or drawable is left to a
//! [`BlobDecoder`] supplied by the caller.

use crate::{Blob, BlobFormat, Error, Result};

/// Decodes blob payloads of the sub-formats it understands.
pub trait BlobDecoder {
    /// Decoded representation.
    type Output;

    /// Check whether this decoder handles `format`.
    fn supports(&self, format: BlobFormat) -> bool;

    /// Decode a payload. Only called for supported formats.
    fn decode(&self, format: BlobFormat, data: &[u8]) -> Result<Self::Output>;
}

impl Blob {
    /// Decode this blob, failing with [`Error::UnsupportedFormat`] when the
    /// decoder does not handle its sub-format.
    pub fn decode_with<D: BlobDecoder>(&self, decoder: &D) -> Result<D::Output> {
        if !decoder.supports(self.format) {
            return Err(Error::UnsupportedFormat(self.format));
        }
        decoder.decode(self.format, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports the payload length of sound blobs.
    struct SoundLength;

    impl BlobDecoder for SoundLength {
        type Output = usize;

        fn supports(&self, format: BlobFormat) -> bool {
            format == BlobFormat::Sound
        }

        fn decode(&self, _format: BlobFormat, data: &[u8]) -> Result<usize> {
            Ok(data.len())
        }
    }

    #[test]
    fn test_supported_format() {
        let blob = Blob::new(BlobFormat::Sound, vec![0u8; 12]);
        assert_eq!(blob.decode_with(&SoundLength).unwrap(), 12);
    }

    #[test]
    fn test_unsupported_format() {
        let blob = Blob::new(BlobFormat::Other(7), vec![1, 2, 3]);
        assert!(matches!(
            blob.decode_with(&SoundLength),
            Err(Error::UnsupportedFormat(BlobFormat::Other(7)))
        ));
    }
}
