//! Encrypted archive strings.
//!
//! A string is a length prefix followed by its masked payload: Latin-1 bytes
//! when every character is at most U+00FF, UTF-16 code units otherwise.

use std::io::Write;

use wzlib_common::{BinaryReader, BinaryWriter, StringLength};
use wzlib_crypto::ArchiveKeyContext;

use crate::Result;

/// Read and decrypt one string.
pub fn read_string(reader: &mut BinaryReader<'_>, context: &mut ArchiveKeyContext) -> Result<String> {
    let offset = reader.position();
    match reader.read_string_length()? {
        StringLength::Narrow(len) => {
            let mut bytes = reader.read_bytes(len)?.to_vec();
            context.crypt_narrow(&mut bytes);
            // single-byte payloads are Latin-1
            Ok(bytes.into_iter().map(char::from).collect())
        }
        StringLength::Wide(len) => {
            let mut units: Vec<u16> = reader
                .read_bytes(len * 2)?
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            context.crypt_wide(&mut units);
            String::from_utf16(&units).map_err(|_| wzlib_common::Error::Utf16 { offset }.into())
        }
    }
}

/// Encrypt and write one string.
pub fn write_string<W: Write>(
    writer: &mut BinaryWriter<W>,
    context: &mut ArchiveKeyContext,
    value: &str,
) -> Result<()> {
    if let Some(mut bytes) = latin1(value) {
        context.crypt_narrow(&mut bytes);
        writer.write_string_length(StringLength::Narrow(bytes.len()))?;
        writer.write_bytes(&bytes)?;
    } else {
        let mut units: Vec<u16> = value.encode_utf16().collect();
        context.crypt_wide(&mut units);
        writer.write_string_length(StringLength::Wide(units.len()))?;
        for unit in units {
            writer.write_u16(unit)?;
        }
    }
    Ok(())
}

fn latin1(value: &str) -> Option<Vec<u8>> {
    value.chars().map(|c| u8::try_from(c).ok()).collect()
}

#[cfg(test)]
mod tests {
    use wzlib_crypto::KeyVariant;

    use super::*;

    fn encode(variant: KeyVariant, value: &str) -> Vec<u8> {
        let mut context = ArchiveKeyContext::for_variant(variant);
        let mut writer = BinaryWriter::new(Vec::new());
        write_string(&mut writer, &mut context, value).unwrap();
        writer.into_inner()
    }

    fn decode(variant: KeyVariant, bytes: &[u8]) -> Result<String> {
        let mut context = ArchiveKeyContext::for_variant(variant);
        read_string(&mut BinaryReader::new(bytes), &mut context)
    }

    #[test]
    fn test_narrow_string_layout() {
        let bytes = encode(KeyVariant::Global, "Property");
        assert_eq!(
            bytes,
            [0xF8, 0x6C, 0x77, 0xFC, 0x79, 0x83, 0x27, 0x19, 0x58]
        );
        assert_eq!(decode(KeyVariant::Global, &bytes).unwrap(), "Property");
    }

    #[test]
    fn test_empty_string() {
        let bytes = encode(KeyVariant::Europe, "");
        assert_eq!(bytes, [0x00]);
        assert_eq!(decode(KeyVariant::Europe, &bytes).unwrap(), "");
    }

    #[test]
    fn test_wide_string_round_trip() {
        let bytes = encode(KeyVariant::Europe, "메이플");
        assert_eq!(bytes[0], 3);
        assert_eq!(bytes.len(), 1 + 6);
        assert_eq!(decode(KeyVariant::Europe, &bytes).unwrap(), "메이플");
    }

    #[test]
    fn test_latin1_string_stays_single_byte() {
        // "é" (0xE9) masked with 0xAA under the classic key
        let bytes = [0xFF, 0x43];
        assert_eq!(decode(KeyVariant::Classic, &bytes).unwrap(), "é");
        assert_eq!(encode(KeyVariant::Classic, "é"), bytes);

        let text = "Müller ÿ 1½";
        let encoded = encode(KeyVariant::Global, text);
        assert_eq!(encoded[0] as i8, -(text.chars().count() as i8));
        assert_eq!(decode(KeyVariant::Global, &encoded).unwrap(), text);
    }

    #[test]
    fn test_above_latin1_uses_utf16() {
        // U+0100 is the first char that needs the wide form
        let encoded = encode(KeyVariant::Europe, "éĀ");
        assert_eq!(encoded[0], 2);
        assert_eq!(encoded.len(), 1 + 4);
        assert_eq!(decode(KeyVariant::Europe, &encoded).unwrap(), "éĀ");
    }

    #[test]
    fn test_wrong_key_garbles() {
        let bytes = encode(KeyVariant::Global, "Property");
        assert_ne!(decode(KeyVariant::Classic, &bytes).unwrap(), "Property");
    }

    #[test]
    fn test_truncated_payload() {
        let err = decode(KeyVariant::Global, &[0xF8, 0x6C, 0x77]).unwrap_err();
        assert!(err.is_truncated());
    }
}
