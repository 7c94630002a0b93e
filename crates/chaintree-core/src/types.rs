//! Strong type definitions for ChainTree content addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte content identifier, computed as Blake3(canonical node bytes).
///
/// Two ContentIds are equal iff their hash bytes are equal. Nodes are
/// write-once, so an id always names the same bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub [u8; 32]);

impl ContentId {
    /// Compute the id of a serialized block.
    pub fn for_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create a new ContentId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidContentId(e.to_string()))?;
        Self::try_from(bytes.as_slice())
            .map_err(|_| CoreError::InvalidContentId(format!("expected 32 bytes, got {}", bytes.len())))
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for ContentId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for ContentId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for ContentId {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_hex_roundtrip() {
        let id = ContentId::from_bytes([0x42; 32]);
        let recovered = ContentId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_content_id_rejects_short_hex() {
        assert!(ContentId::from_hex("abcd").is_err());
        assert!(ContentId::from_hex("not hex").is_err());
    }

    #[test]
    fn test_content_id_is_hash_of_bytes() {
        let a = ContentId::for_bytes(b"node bytes");
        let b = ContentId::for_bytes(b"node bytes");
        let c = ContentId::for_bytes(b"other bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_content_id_debug() {
        let id = ContentId::from_bytes([0xcd; 32]);
        assert_eq!(format!("{:?}", id), "ContentId(cdcdcdcdcdcdcdcd)");
    }
}
