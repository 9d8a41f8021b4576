//! Key material: the AES user key, well-known IV seeds and key expansion.

use std::fmt;

use tracing::debug;

use crate::constants::USER_KEY_SEED;
use crate::session::ArchiveKeyContext;
use crate::{Error, Result};

/// Size of the AES-256 user key in bytes.
pub const BASE_KEY_LEN: usize = 32;

/// A 32-byte AES-256 user key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BaseKey([u8; BASE_KEY_LEN]);

impl BaseKey {
    /// The key shipped with the client.
    pub const DEFAULT: Self = Self::from_seed(&USER_KEY_SEED);

    /// Build a key by placing each seed byte at every fourth position.
    pub const fn from_seed(seed: &[u8; 8]) -> Self {
        let mut key = [0u8; BASE_KEY_LEN];
        let mut i = 0;
        while i < seed.len() {
            key[i * 4] = seed[i];
            i += 1;
        }
        Self(key)
    }

    /// Build a key from raw bytes, which must be exactly 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key: [u8; BASE_KEY_LEN] = bytes.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: BASE_KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// Get the raw key bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; BASE_KEY_LEN] {
        &self.0
    }
}

impl Default for BaseKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for BaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BaseKey({})", hex::encode(self.0))
    }
}

/// Tile `seed[..unit_len]` until the output holds `unit_len * repeats` bytes.
///
/// Fails if `unit_len` is zero or longer than the seed.
pub fn expand_key(seed: &[u8], unit_len: usize, repeats: usize) -> Result<Vec<u8>> {
    if unit_len == 0 || unit_len > seed.len() {
        return Err(Error::InvalidKeyLength {
            expected: unit_len,
            actual: seed.len(),
        });
    }
    Ok((0..unit_len * repeats).map(|x| seed[x % unit_len]).collect())
}

/// Expand a 4-byte IV into the 16-byte block that seeds the keystream.
#[inline]
pub fn expand_iv(iv: [u8; 4]) -> [u8; 16] {
    std::array::from_fn(|x| iv[x % iv.len()])
}

/// The well-known IV seeds that archives are encrypted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyVariant {
    /// Global service.
    Global,
    /// European service.
    Europe,
    /// Older archives whose string payloads are only masked, not keyed.
    Classic,
}

impl KeyVariant {
    /// Every known variant, in guessing order.
    pub const ALL: [KeyVariant; 3] = [KeyVariant::Global, KeyVariant::Europe, KeyVariant::Classic];

    /// The IV seed for this variant.
    pub const fn iv(&self) -> [u8; 4] {
        match self {
            KeyVariant::Global => [0x4D, 0x23, 0xC7, 0x2B],
            KeyVariant::Europe => [0xB9, 0x7D, 0x63, 0xE9],
            KeyVariant::Classic => [0x00, 0x00, 0x00, 0x00],
        }
    }

    /// Locale version code identifying this variant.
    pub const fn locale_version(&self) -> i16 {
        match self {
            KeyVariant::Global => 8,
            KeyVariant::Europe => 9,
            KeyVariant::Classic => 0,
        }
    }

    /// Look up a variant by its locale version code.
    pub fn from_locale_version(version: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.locale_version() == version)
    }
}

/// Find the first candidate version whose key decrypts `sample` to `expected`.
///
/// `sample` is a single-byte string payload as stored in an archive (without
/// its length prefix) and `expected` the plaintext it is known to hold. Only the
/// supplied candidates are tried; codes with no known key are skipped.
pub fn guess_version(candidates: &[i16], sample: &[u8], expected: &[u8]) -> Option<i16> {
    if sample.len() != expected.len() {
        return None;
    }

    candidates.iter().copied().find(|&version| {
        let Some(variant) = KeyVariant::from_locale_version(version) else {
            debug!(version, "no key known for candidate version");
            return false;
        };

        let mut context = ArchiveKeyContext::for_variant(variant);
        let mut decoded = sample.to_vec();
        context.crypt_narrow(&mut decoded);

        let matched = decoded == expected;
        debug!(version, ?variant, matched, "tried candidate version");
        matched
    })
}

/// Find the well-known variant whose key decrypts `sample` to `expected`.
pub fn guess_variant(sample: &[u8], expected: &[u8]) -> Option<KeyVariant> {
    let candidates = KeyVariant::ALL.map(|v| v.locale_version());
    guess_version(&candidates, sample, expected).and_then(KeyVariant::from_locale_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "Property" as stored under each variant's key.
    const PROPERTY_GLOBAL: [u8; 8] = [0x6C, 0x77, 0xFC, 0x79, 0x83, 0x27, 0x19, 0x58];
    const PROPERTY_CLASSIC: [u8; 8] = [0xFA, 0xD9, 0xC3, 0xDD, 0xCB, 0xDD, 0xC4, 0xC8];

    #[test]
    fn test_default_key_layout() {
        let key = BaseKey::DEFAULT;
        let bytes = key.as_bytes();
        assert_eq!(bytes[0], 0x13);
        assert_eq!(bytes[4], 0x08);
        assert_eq!(bytes[28], 0x52);
        assert!(bytes.iter().enumerate().all(|(i, &b)| i % 4 == 0 || b == 0));
    }

    #[test]
    fn test_base_key_from_bytes_rejects_short_key() {
        assert!(matches!(
            BaseKey::from_bytes(&[0u8; 16]),
            Err(Error::InvalidKeyLength { expected: 32, actual: 16 })
        ));
        assert_eq!(BaseKey::from_bytes(BaseKey::DEFAULT.as_bytes()).unwrap(), BaseKey::DEFAULT);
    }

    #[test]
    fn test_expand_key_tiles_seed() {
        let out = expand_key(&[1, 2, 3, 4], 4, 3).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);

        // only the first unit_len bytes of the seed are used
        let out = expand_key(&[9, 8, 7], 2, 2).unwrap();
        assert_eq!(out, vec![9, 8, 9, 8]);

        assert!(expand_key(&[1, 2], 3, 1).is_err());
        assert!(expand_key(&[1, 2], 0, 1).is_err());
    }

    #[test]
    fn test_expand_iv_matches_expand_key() {
        let iv = [0x4D, 0x23, 0xC7, 0x2B];
        assert_eq!(expand_iv(iv).to_vec(), expand_key(&iv, 4, 4).unwrap());
    }

    #[test]
    fn test_guess_version_picks_matching_key() {
        assert_eq!(guess_version(&[9, 0, 8], &PROPERTY_GLOBAL, b"Property"), Some(8));
        assert_eq!(guess_version(&[8, 9, 0], &PROPERTY_CLASSIC, b"Property"), Some(0));
    }

    #[test]
    fn test_guess_version_exhausted() {
        assert_eq!(guess_version(&[9, 0], &PROPERTY_GLOBAL, b"Property"), None);
        assert_eq!(guess_version(&[], &PROPERTY_GLOBAL, b"Property"), None);
        // unknown codes are skipped rather than failing the search
        assert_eq!(guess_version(&[42, 8], &PROPERTY_GLOBAL, b"Property"), Some(8));
    }

    #[test]
    fn test_guess_variant() {
        assert_eq!(guess_variant(&PROPERTY_GLOBAL, b"Property"), Some(KeyVariant::Global));
        assert_eq!(guess_variant(&PROPERTY_CLASSIC, b"Property"), Some(KeyVariant::Classic));
        assert_eq!(guess_variant(b"garbage!", b"Property"), None);
    }

    #[test]
    fn test_variant_lookup() {
        for variant in KeyVariant::ALL {
            assert_eq!(KeyVariant::from_locale_version(variant.locale_version()), Some(variant));
        }
        assert_eq!(KeyVariant::from_locale_version(83), None);
    }
}
