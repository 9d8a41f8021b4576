//! Archive key context: the keystream shared by one decode or encode pass.

use std::fmt;

use tracing::trace;

use crate::keys::{BaseKey, KeyVariant};
use crate::stream::Keystream;
use crate::CipherState;

/// Keystream growth step in bytes.
const KEYSTREAM_BATCH: usize = 4096;

/// Initial mask for single-byte string payloads.
const NARROW_MASK: u8 = 0xAA;

/// Initial mask for UTF-16 string payloads.
const WIDE_MASK: u16 = 0xAAAA;

/// The resolved IV seed, version and user key for one archive session.
///
/// The string keystream is a continuous AES output-feedback stream seeded by
/// the IV and grown on demand. An all-zero IV yields an all-zero keystream.
#[derive(Clone)]
pub struct ArchiveKeyContext {
    iv_seed: [u8; 4],
    version: i16,
    base_key: BaseKey,
    keystream: Vec<u8>,
}

impl ArchiveKeyContext {
    /// Create a context for an IV seed and declared version.
    pub fn new(iv_seed: [u8; 4], version: i16) -> Self {
        Self {
            iv_seed,
            version,
            base_key: BaseKey::DEFAULT,
            keystream: Vec::new(),
        }
    }

    /// Create a context for one of the well-known key variants.
    pub fn for_variant(variant: KeyVariant) -> Self {
        Self::new(variant.iv(), variant.locale_version())
    }

    /// Replace the user key. Discards any keystream generated so far.
    pub fn with_base_key(mut self, base_key: BaseKey) -> Self {
        self.base_key = base_key;
        self.keystream.clear();
        self
    }

    /// IV seed of this session.
    #[inline]
    pub fn iv_seed(&self) -> [u8; 4] {
        self.iv_seed
    }

    /// Declared version of this session.
    #[inline]
    pub fn version(&self) -> i16 {
        self.version
    }

    /// User key of this session.
    #[inline]
    pub fn base_key(&self) -> &BaseKey {
        &self.base_key
    }

    /// A fresh cipher state seeded from this session.
    ///
    /// Each independently processed section should get its own state.
    pub fn cipher_state(&self) -> CipherState {
        CipherState::with_key(self.iv_seed, self.version, self.base_key)
    }

    /// Get the first `len` keystream bytes, generating more if needed.
    pub fn keystream(&mut self, len: usize) -> &[u8] {
        self.ensure(len);
        &self.keystream[..len]
    }

    fn ensure(&mut self, len: usize) {
        if self.keystream.len() >= len {
            return;
        }

        let start = self.keystream.len();
        let target = len.div_ceil(KEYSTREAM_BATCH) * KEYSTREAM_BATCH;
        self.keystream.resize(target, 0);

        if self.iv_seed == [0; 4] {
            return;
        }

        trace!(from = start, to = target, iv = %hex::encode(self.iv_seed), "growing keystream");
        let mut generator = match start.checked_sub(16) {
            Some(last) => {
                let mut block = [0u8; 16];
                block.copy_from_slice(&self.keystream[last..start]);
                Keystream::resume(&self.base_key, block)
            }
            None => Keystream::new(&self.base_key, self.iv_seed),
        };
        generator.apply(&mut self.keystream[start..]);
    }

    /// Mask a single-byte string payload in place. Applying it twice restores the input.
    pub fn crypt_narrow(&mut self, bytes: &mut [u8]) {
        let key = self.keystream(bytes.len());
        let mut mask = NARROW_MASK;
        for (byte, k) in bytes.iter_mut().zip(key) {
            *byte ^= mask ^ k;
            mask = mask.wrapping_add(1);
        }
    }

    /// Mask a UTF-16 string payload in place. Applying it twice restores the input.
    pub fn crypt_wide(&mut self, units: &mut [u16]) {
        let key = self.keystream(units.len() * 2);
        let mut mask = WIDE_MASK;
        for (unit, k) in units.iter_mut().zip(key.chunks_exact(2)) {
            *unit ^= mask ^ u16::from_le_bytes([k[0], k[1]]);
            mask = mask.wrapping_add(1);
        }
    }
}

impl fmt::Debug for ArchiveKeyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveKeyContext")
            .field("iv_seed", &hex::encode(self.iv_seed))
            .field("version", &self.version)
            .field("keystream_len", &self.keystream.len())
            .finish()
    }
}
