//! Decoding archive images whose key is not declared.
//!
//! An image starts with its root node, whose name the caller usually knows.
//! Each well-known key is tried on that name; the first one that yields it
//! becomes the key of the whole session.

use tracing::{debug, info};
use wzlib_common::BinaryReader;
use wzlib_crypto::{ArchiveKeyContext, KeyVariant};
use wzlib_property::{read_string, PropertyTree, TreeCodec};

use crate::{Error, Result};

/// Find the well-known key under which the root node of `data` is named `root_name`.
pub fn detect_variant(data: &[u8], root_name: &str) -> Option<KeyVariant> {
    KeyVariant::ALL.into_iter().find(|&variant| {
        let mut reader = BinaryReader::new(data);
        let mut context = ArchiveKeyContext::for_variant(variant);
        // skip the tag byte
        let name = reader
            .read_u8()
            .ok()
            .and_then(|_| read_string(&mut reader, &mut context).ok());
        let matched = name.as_deref() == Some(root_name);
        debug!(?variant, matched, "tried root name");
        matched
    })
}

/// Detect the key from the root name, then decode the whole image with it.
pub fn decode_image(data: &[u8], root_name: &str) -> Result<(KeyVariant, PropertyTree)> {
    let variant = detect_variant(data, root_name).ok_or_else(|| Error::UnknownKey {
        root_name: root_name.to_string(),
    })?;
    info!(?variant, len = data.len(), "decoding image");

    let mut codec = TreeCodec::new(ArchiveKeyContext::for_variant(variant));
    let tree = codec.decode(data)?;
    Ok((variant, tree))
}

#[cfg(test)]
mod tests {
    use wzlib_property::PropertyBuilder;

    use super::*;

    fn image(variant: KeyVariant) -> Vec<u8> {
        let tree = PropertyBuilder::map("Property")
            .child(PropertyBuilder::new("info", 1))
            .build()
            .unwrap();
        TreeCodec::new(ArchiveKeyContext::for_variant(variant))
            .encode(&tree)
            .unwrap()
    }

    #[test]
    fn test_detect_each_variant() {
        for variant in KeyVariant::ALL {
            assert_eq!(detect_variant(&image(variant), "Property"), Some(variant));
        }
    }

    #[test]
    fn test_detect_wrong_name() {
        assert_eq!(detect_variant(&image(KeyVariant::Global), "Other"), None);
        assert_eq!(detect_variant(&[], "Property"), None);
    }

    #[test]
    fn test_decode_image_unknown_key() {
        assert!(matches!(
            decode_image(&image(KeyVariant::Europe), "Nope"),
            Err(Error::UnknownKey { .. })
        ));
    }
}
