//! Cipher layer shared by archives and the network protocol.
//!
//! Two consumers use the same construction:
//!
//! - The network layer encrypts every packet body with [`CipherState::crypt`],
//!   which XORs an AES-256 output-feedback keystream seeded by the current IV
//!   and then evolves the IV through a fixed substitution-and-rotate shuffle.
//!   Packet headers mask the payload size with the IV and protocol version.
//! - Archives mask every string payload with a keystream derived once per
//!   session by an [`ArchiveKeyContext`]. When the key is not declared it is
//!   guessed among a small set of well-known IV seeds.
//!
//! # Example
//!
//! ```
//! use wzlib_crypto::{packet_length, CipherState};
//!
//! let mut send = CipherState::new([0x12, 0x34, 0x56, 0x78], 83);
//! let mut recv = send.clone();
//!
//! let mut body = b"hello".to_vec();
//! let header = send.header_to_server(body.len() as i32);
//! send.crypt(&mut body);
//!
//! assert!(recv.validate_incoming(&header));
//! assert_eq!(packet_length(&header)?, 5);
//! recv.crypt(&mut body);
//! assert_eq!(body, b"hello");
//! # Ok::<(), wzlib_crypto::Error>(())
//! ```

mod constants;
mod error;
mod header;
mod keys;
mod session;
mod stream;

pub use constants::{HEADER_LEN, SHUFFLE_TABLE};
pub use error::{Error, Result};
pub use header::packet_length;
pub use keys::{
    expand_iv, expand_key, guess_variant, guess_version, BaseKey, KeyVariant, BASE_KEY_LEN,
};
pub use session::ArchiveKeyContext;
pub use stream::{advance_iv, shuffle, CipherState};
