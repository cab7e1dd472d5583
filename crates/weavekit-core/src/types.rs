//! Strong type definitions for Weavekit.
//!
//! Identifiers are newtypes to prevent mixing up ids, addresses and raw
//! hashes at compile time. Both render as base64url, their wire encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::{b64url_decode, b64url_encode, Sha256Hash};
use crate::error::CoreError;

/// A 32-byte transaction identifier, computed as SHA-256(signature).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub [u8; 32]);

impl TransactionId {
    /// Derive the id of a transaction from its raw signature bytes.
    pub fn from_signature(signature: &[u8]) -> Self {
        Self(Sha256Hash::hash(signature).0)
    }

    /// Create a new TransactionId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to base64url string.
    pub fn to_b64url(&self) -> String {
        b64url_encode(&self.0)
    }

    /// Parse from a base64url string.
    pub fn from_b64url(s: &str) -> Result<Self, CoreError> {
        let bytes = b64url_decode(s)?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::DecodingError(format!("transaction id must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", &self.to_b64url()[..12])
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_b64url())
    }
}

impl FromStr for TransactionId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_b64url(s)
    }
}

impl AsRef<[u8]> for TransactionId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_b64url())
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_b64url(&s).map_err(serde::de::Error::custom)
    }
}

/// A wallet address: base64url(SHA-256(public modulus)).
///
/// The encoded string is kept so that ordering is lexicographic over the
/// address string, which is what collections of identities sort by.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Derive the address owning a public modulus.
    pub fn from_owner(owner: &[u8]) -> Self {
        Self(Sha256Hash::hash(owner).to_b64url())
    }

    /// Parse an address string, checking it decodes to 32 bytes.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let bytes = b64url_decode(s)?;
        if bytes.len() != 32 {
            return Err(CoreError::DecodingError(format!(
                "address must decode to 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(b64url_encode(&bytes)))
    }

    /// The encoded address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The decoded address bytes, as hashed into a transaction's target field.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Constructors only admit strings that decode
        b64url_decode(&self.0).unwrap_or_default()
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

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
