//! Hash primitives and base64url helpers.
//!
//! SHA-256 addresses chunks, transaction ids and wallet addresses. SHA-384 is
//! reserved for the deep hash that produces the signed message.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256, Sha384};
use std::fmt;

use crate::error::{CoreError, Result};

/// Encode bytes as unpadded base64url, the encoding of every binary wire field.
pub fn b64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode base64url. Trailing padding is tolerated.
pub fn b64url_decode(s: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s.trim_end_matches('='))
        .map_err(|e| CoreError::DecodingError(format!("invalid base64url: {}", e)))
}

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of data.
    pub fn hash(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Hash the concatenation of several buffers without materializing it.
    pub fn hash_all(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Convert to base64url.
    pub fn to_b64url(&self) -> String {
        b64url_encode(&self.0)
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256({}...)", &self.to_hex()[..8])
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Sha256Hash {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// A 48-byte SHA-384 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha384Hash(pub [u8; 48]);

impl Sha384Hash {
    /// Compute the SHA-384 hash of data.
    pub fn hash(data: &[u8]) -> Self {
        Self::from_digest(Sha384::digest(data).as_slice())
    }

    /// Hash the concatenation of several buffers.
    pub fn hash_all(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha384::new();
        for part in parts {
            hasher.update(part);
        }
        Self::from_digest(hasher.finalize().as_slice())
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut arr = [0u8; 48];
        arr.copy_from_slice(digest);
        Self(arr)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 48] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Sha384Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA384({}...)", &self.to_hex()[..8])
    }
}

impl AsRef<[u8]> for Sha384Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vectors() {
        assert_eq!(
            Sha256Hash::hash(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            Sha256Hash::hash(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha384_known_vectors() {
        assert_eq!(
            Sha384Hash::hash(b"abc").to_hex(),
            "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed\
             8086072ba1e7cc2358baeca134c825a7"
        );
    }

    #[test]
    fn test_hash_all_matches_concatenation() {
        let joined = Sha256Hash::hash(b"hello world");
        let parts = Sha256Hash::hash_all(&[&b"hello"[..], b" ", b"world"]);
        assert_eq!(joined, parts);

        let joined = Sha384Hash::hash(b"blob11");
        let parts = Sha384Hash::hash_all(&[&b"blob"[..], b"11"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_b64url_roundtrip_and_padding() {
        let data = [0xfb, 0xff, 0x00, 0x10];
        let encoded = b64url_encode(&data);
        assert!(!encoded.contains('+') && !encoded.contains('/') && !encoded.contains('='));
        assert_eq!(b64url_decode(&encoded).unwrap(), data);

        // Padded input is accepted too
        assert_eq!(b64url_decode("-_8AEA==").unwrap(), data);
    }

    #[test]
    fn test_b64url_rejects_standard_alphabet() {
        assert!(b64url_decode("+/8AEA").is_err());
    }
}
