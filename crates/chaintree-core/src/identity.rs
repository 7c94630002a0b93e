//! Addresses and DIDs.
//!
//! A ChainTree is named by `did:tupelo:<address>`, where the address is
//! `0x` followed by 40 lowercase hex characters derived from the tree's
//! genesis public key. Both strings have fixed lengths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::Ed25519PublicKey;
use crate::error::CoreError;

/// Prefix shared by every ChainTree DID.
pub const DID_PREFIX: &str = "did:tupelo:";

/// Length of an address string, including its `0x` prefix.
pub const ADDRESS_LEN: usize = 42;

/// Length of a full DID string.
pub const DID_LEN: usize = DID_PREFIX.len() + ADDRESS_LEN;

const ADDRESS_DOMAIN: &[u8] = b"chaintree-address-v0:";

/// A 42-character owner address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Derive the address of a public key.
    ///
    /// The address is the last 20 bytes of Blake3(domain || public key).
    pub fn from_public_key(key: &Ed25519PublicKey) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ADDRESS_DOMAIN);
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();
        Self(format!("0x{}", hex::encode(&digest.as_bytes()[12..])))
    }

    /// Parse and validate an address string.
    ///
    /// Hex digits are folded to lowercase so parsed and derived addresses
    /// compare equal.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.len() != ADDRESS_LEN {
            return Err(CoreError::InvalidAddress(format!(
                "expected {} characters, got {}",
                ADDRESS_LEN,
                s.len()
            )));
        }
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::InvalidAddress(format!("missing 0x prefix: {}", s)))?;
        if !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAddress(format!("not hex: {}", s)));
        }
        Ok(Self(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_did(&self) -> Did {
        Did(format!("{}{}", DID_PREFIX, self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

/// A ChainTree identifier: `did:tupelo:` followed by an [`Address`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// The DID of the tree whose genesis key is `key`.
    pub fn from_public_key(key: &Ed25519PublicKey) -> Self {
        Address::from_public_key(key).to_did()
    }

    /// Parse and validate a DID string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let addr = s
            .strip_prefix(DID_PREFIX)
            .ok_or_else(|| CoreError::InvalidDid(format!("missing {} prefix: {}", DID_PREFIX, s)))?;
        let addr = Address::parse(addr).map_err(|e| CoreError::InvalidDid(e.to_string()))?;
        Ok(addr.to_did())
    }

    /// The address this DID wraps.
    pub fn address(&self) -> Address {
        Address(self.0[DID_PREFIX.len()..].to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Did({})", self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}
