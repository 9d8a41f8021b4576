//! Common utilities for wzlib.
//!
//! This crate provides the byte-level primitives shared by every wzlib crate:
//!
//! - [`BinaryReader`] - Position-tracked reading from an in-memory byte slice
//! - [`BinaryWriter`] - Position-tracked writing into any [`std::io::Write`] sink
//! - [`StringLength`] - The compact length prefix that precedes archive strings
//!
//! Archive integers come in two flavours: fixed-width little-endian and
//! "compressed", where a single signed byte stands in for the full value
//! unless it equals `-128`, in which case the full-width value follows.

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{BinaryReader, StringLength};
pub use writer::BinaryWriter;

/// Marker byte announcing that a full-width value follows a compressed integer.
pub const COMPRESSED_MARKER: i8 = i8::MIN;
