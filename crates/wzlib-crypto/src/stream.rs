//! Rolling-IV stream cipher.
//!
//! Every buffer is XORed against an AES-256 output-feedback keystream seeded
//! by the current 4-byte IV expanded to a full block. Once the buffer is done
//! the IV is evolved through [`advance_iv`], so consecutive buffers on one
//! [`CipherState`] never share a keystream.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use tracing::trace;

use crate::constants::{CHUNK_LEN, FIRST_CHUNK_LEN, SHUFFLE_SEED, SHUFFLE_TABLE};
use crate::keys::{expand_iv, BaseKey};

/// AES block size in bytes.
const BLOCK_LEN: usize = 16;

/// Evolve the IV working bytes with one input byte.
///
/// The sub-steps share the working bytes and must run in exactly this order.
pub fn shuffle(input: u8, state: &mut [u8; 4]) {
    let mut a = state[1];
    let mut b = SHUFFLE_TABLE[a as usize].wrapping_sub(input);
    state[0] = state[0].wrapping_add(b);

    b = state[2] ^ SHUFFLE_TABLE[input as usize];
    a = a.wrapping_sub(b);
    state[1] = a;

    a = state[3];
    b = SHUFFLE_TABLE[a as usize].wrapping_add(input) ^ state[2];
    a = a.wrapping_sub(state[0]);
    state[2] = b;
    state[3] = a.wrapping_add(SHUFFLE_TABLE[input as usize]);

    *state = u32::from_le_bytes(*state).rotate_left(3).to_le_bytes();
}

/// Compute the IV that follows `iv`.
pub fn advance_iv(iv: [u8; 4]) -> [u8; 4] {
    let mut next = SHUFFLE_SEED;
    for byte in iv {
        shuffle(byte, &mut next);
    }
    next
}

/// AES-256 output-feedback keystream generator.
///
/// Each keystream block is the encryption of the previous one.
pub(crate) struct Keystream {
    cipher: Aes256,
    block: [u8; BLOCK_LEN],
}

impl Keystream {
    /// Start a keystream from an IV.
    pub(crate) fn new(key: &BaseKey, iv: [u8; 4]) -> Self {
        Self::resume(key, expand_iv(iv))
    }

    /// Continue a keystream whose last emitted block is `block`.
    pub(crate) fn resume(key: &BaseKey, block: [u8; BLOCK_LEN]) -> Self {
        let cipher = Aes256::new(GenericArray::from_slice(key.as_bytes()));
        Self { cipher, block }
    }

    fn next_block(&mut self) -> &[u8; BLOCK_LEN] {
        let block = GenericArray::from_mut_slice(&mut self.block);
        self.cipher.encrypt_block(block);
        &self.block
    }

    /// XOR the keystream into `data`.
    ///
    /// A trailing partial block consumes a whole keystream block.
    pub(crate) fn apply(&mut self, data: &mut [u8]) {
        for chunk in data.chunks_mut(BLOCK_LEN) {
            let block = self.next_block();
            for (byte, key) in chunk.iter_mut().zip(block.iter()) {
                *byte ^= key;
            }
        }
    }
}

/// Per-connection cipher state: the current IV and the protocol version.
///
/// One state must drive exactly one sequential stream of buffers. Parallel
/// streams each need their own state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherState {
    iv: [u8; 4],
    version: i16,
    key: BaseKey,
}

impl CipherState {
    /// Create a state using the default user key.
    pub fn new(iv: [u8; 4], version: i16) -> Self {
        Self::with_key(iv, version, BaseKey::DEFAULT)
    }

    /// Create a state with a custom user key.
    pub fn with_key(iv: [u8; 4], version: i16, key: BaseKey) -> Self {
        Self { iv, version, key }
    }

    /// Current IV.
    #[inline]
    pub fn iv(&self) -> [u8; 4] {
        self.iv
    }

    /// Protocol version.
    #[inline]
    pub fn version(&self) -> i16 {
        self.version
    }

    /// User key.
    #[inline]
    pub fn key(&self) -> &BaseKey {
        &self.key
    }

    /// Replace the IV, e.g. when a logically independent buffer starts.
    pub fn reset_iv(&mut self, iv: [u8; 4]) {
        self.iv = iv;
    }

    /// Advance the IV once without touching any data.
    pub fn advance(&mut self) {
        let next = advance_iv(self.iv);
        trace!(from = %hex::encode(self.iv), to = %hex::encode(next), "advanced IV");
        self.iv = next;
    }

    /// Encrypt or decrypt `data` in place, then advance the IV.
    ///
    /// The keystream restarts from the current IV at the start of every
    /// chunk: the first chunk covers 0x5B0 bytes, later chunks 0x5B4 bytes.
    /// The IV advances even when `data` is empty.
    pub fn crypt(&mut self, data: &mut [u8]) {
        trace!(len = data.len(), iv = %hex::encode(self.iv), "crypt");

        let mut offset = 0;
        let mut chunk_len = FIRST_CHUNK_LEN;
        while offset < data.len() {
            let end = (offset + chunk_len).min(data.len());
            Keystream::new(&self.key, self.iv).apply(&mut data[offset..end]);
            offset = end;
            chunk_len = CHUNK_LEN;
        }

        self.advance();
    }
}
