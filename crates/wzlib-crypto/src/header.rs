//! Packet header codec.
//!
//! A header is four bytes: the low 16 bits of a masked copy of the IV,
//! followed by that mask XORed with the payload size. Building a header never
//! advances the IV; only [`CipherState::crypt`] does.

use crate::constants::HEADER_LEN;
use crate::{CipherState, Error, Result};

/// Length of the prefix checked by [`CipherState::validate_incoming`].
const PREFIX_LEN: usize = 2;

impl CipherState {
    /// Upper half of the IV as a 16-bit value.
    #[inline]
    fn iv_word(&self) -> i32 {
        i32::from(self.iv()[3]) * 0x100 + i32::from(self.iv()[2])
    }

    /// Build the header for a packet sent to a client.
    pub fn header_to_client(&self, payload_size: i32) -> [u8; 4] {
        let a = self.iv_word() ^ -(i32::from(self.version()) + 1);
        let b = a ^ payload_size;

        let h0 = a as u8;
        let h1 = (a.wrapping_sub(i32::from(h0)) >> 8) as u8;
        let h2 = (b ^ 0x100) as u8;
        let h3 = (b.wrapping_sub(i32::from(h2)) >> 8) as u8;
        [h0, h1, h2, h3]
    }

    /// Build the header for a packet sent to a server.
    pub fn header_to_server(&self, payload_size: i32) -> [u8; 4] {
        let a = self.iv_word() ^ i32::from(self.version());
        let b = a ^ payload_size;

        let [h0, h1] = (a as u16).to_le_bytes();
        let [h2, h3] = (b as u16).to_le_bytes();
        [h0, h1, h2, h3]
    }

    /// Check that an incoming packet starts with this session's masked version.
    ///
    /// Returns `false` for prefixes shorter than two bytes.
    pub fn validate_incoming(&self, prefix: &[u8]) -> bool {
        self.check_incoming(prefix).is_ok()
    }

    /// Like [`Self::validate_incoming`] but reports why a prefix was rejected.
    pub fn check_incoming(&self, prefix: &[u8]) -> Result<()> {
        if prefix.len() < PREFIX_LEN {
            return Err(Error::MalformedHeader {
                expected: PREFIX_LEN,
                length: prefix.len(),
            });
        }

        let iv = self.iv();
        let actual = i16::from_le_bytes([prefix[0] ^ iv[2], prefix[1] ^ iv[3]]);
        if actual != self.version() {
            return Err(Error::VersionMismatch {
                expected: self.version(),
                actual,
            });
        }
        Ok(())
    }
}

/// Extract the payload length from a packet header of either direction.
pub fn packet_length(header: &[u8]) -> Result<i32> {
    if header.len() < HEADER_LEN {
        return Err(Error::MalformedHeader {
            expected: HEADER_LEN,
            length: header.len(),
        });
    }

    let low = i32::from(header[0]) + (i32::from(header[1]) << 8);
    let high = i32::from(header[2]) + (i32::from(header[3]) << 8);
    Ok(low ^ high)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_header_to_server_layout() {
        let state = CipherState::new([0x00, 0x00, 0x34, 0x12], 83);
        // a = 0x1234 ^ 83 = 0x1267, b = a ^ 10 = 0x126D
        assert_eq!(state.header_to_server(10), [0x67, 0x12, 0x6D, 0x12]);
    }

    #[test]
    fn test_header_to_client_layout() {
        let state = CipherState::new([0x00, 0x00, 0x34, 0x12], 83);
        // a = 0x1234 ^ -84 = 0x1234 ^ 0xFFFFFFAC = 0xFFFFED98, b = a ^ 10 = 0xFFFFED92
        assert_eq!(state.header_to_client(10), [0x98, 0xED, 0x92, 0xED]);
    }

    #[test]
    fn test_headers_do_not_advance_iv() {
        let state = CipherState::new([1, 2, 3, 4], 83);
        let _ = state.header_to_client(100);
        let _ = state.header_to_server(100);
        assert_eq!(state.iv(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_packet_length_short_header() {
        assert!(matches!(
            packet_length(&[0x01, 0x02, 0x03]),
            Err(Error::MalformedHeader { expected: 4, length: 3 })
        ));
        assert!(packet_length(&[]).is_err());
    }

    #[test]
    fn test_validate_incoming_accepts_masked_version() {
        let state = CipherState::new([0xAA, 0xBB, 0xCC, 0xDD], 83);
        let [lo, hi] = 83i16.to_le_bytes();
        assert!(state.validate_incoming(&[0xCC ^ lo, 0xDD ^ hi]));
        assert!(state.validate_incoming(&state.header_to_server(42)));
    }

    #[test]
    fn test_validate_incoming_rejects_single_bit_flips() {
        let state = CipherState::new([0xAA, 0xBB, 0xCC, 0xDD], 83);
        let [lo, hi] = 83i16.to_le_bytes();
        let prefix = [0xCC ^ lo, 0xDD ^ hi];

        for byte in 0..2 {
            for bit in 0..8 {
                let mut flipped = prefix;
                flipped[byte] ^= 1 << bit;
                assert!(!state.validate_incoming(&flipped), "byte {} bit {}", byte, bit);
            }
        }
    }

    #[test]
    fn test_check_incoming_reports_mismatch() {
        let state = CipherState::new([0, 0, 0, 0], 83);
        assert!(matches!(
            state.check_incoming(&[95, 0]),
            Err(Error::VersionMismatch { expected: 83, actual: 95 })
        ));
        assert!(matches!(
            state.check_incoming(&[83]),
            Err(Error::MalformedHeader { .. })
        ));
    }

    proptest! {
        #[test]
        fn header_length_symmetry(
            iv in any::<[u8; 4]>(),
            version in any::<i16>(),
            size in 0i32..=0xFFFF,
        ) {
            let state = CipherState::new(iv, version);
            prop_assert_eq!(packet_length(&state.header_to_server(size)).unwrap(), size);
            prop_assert_eq!(packet_length(&state.header_to_client(size)).unwrap(), size);
        }
    }
}
