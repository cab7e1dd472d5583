//! Signing identities.
//!
//! A [`Signer`] is anything that can expose an RSA public modulus and produce
//! RSA-PSS (SHA-256) signatures with it. [`Wallet`] is the software
//! implementation over an in-memory private key, loaded from a JWK.
//!
//! PSS signatures are randomized: signing the same message twice gives two
//! different signatures that both verify.

use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::crypto::{b64url_decode, b64url_encode};
use crate::error::{CoreError, Result};
use crate::types::Address;

/// Public exponent of every network key.
pub const PUBLIC_EXPONENT: u64 = 65537;

/// A signing capability.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait Signer: Send + Sync {
    /// The raw public modulus, big-endian.
    fn owner(&self) -> &[u8];

    /// Sign a message with RSA-PSS over SHA-256.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// The address derived from the public modulus.
    fn address(&self) -> Address {
        Address::from_owner(self.owner())
    }
}

/// A JSON Web Key holding an RSA private key.
///
/// All numbers are base64url big-endian. CRT parameters are accepted but not
/// required; they are recomputed from the primes.
#[derive(Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default = "default_kty")]
    pub kty: String,
    pub n: String,
    pub e: String,
    pub d: String,
    pub p: String,
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

fn default_kty() -> String {
    "RSA".to_string()
}

impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("n", &self.n.get(..12).unwrap_or(&self.n))
            .finish_non_exhaustive()
    }
}

/// A software RSA identity.
///
/// Wallets compare, order and hash by address.
#[derive(Clone)]
pub struct Wallet {
    key: RsaPrivateKey,
    owner: Vec<u8>,
    address: Address,
}

impl Wallet {
    /// Wrap an existing private key.
    pub fn from_key(key: RsaPrivateKey) -> Self {
        let owner = key.n().to_bytes_be();
        let address = Address::from_owner(&owner);
        Self { key, owner, address }
    }

    /// Build from a parsed JWK. The key is checked for consistency.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
        if jwk.kty != "RSA" {
            return Err(CoreError::InvalidKey(format!("unsupported kty {:?}", jwk.kty)));
        }

        let n = jwk_number(&jwk.n, "n")?;
        let e = jwk_number(&jwk.e, "e")?;
        let d = jwk_number(&jwk.d, "d")?;
        let p = jwk_number(&jwk.p, "p")?;
        let q = jwk_number(&jwk.q, "q")?;

        let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        key.validate()
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;

        Ok(Self::from_key(key))
    }

    /// Parse a JWK document.
    pub fn from_jwk_json(json: &str) -> Result<Self> {
        let jwk: Jwk = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidKey(format!("malformed JWK: {}", e)))?;
        Self::from_jwk(&jwk)
    }

    /// Read and parse a JWK file.
    pub fn from_jwk_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_jwk_json(&json)
    }

    /// The public modulus, big-endian.
    pub fn owner(&self) -> &[u8] {
        &self.owner
    }

    /// The wallet's address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The public half of the key.
    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }

    /// Export the private key as a JWK, CRT parameters included.
    pub fn to_jwk(&self) -> Jwk {
        let key = &self.key;
        let primes = key.primes();
        let number = |value: &BigUint| b64url_encode(&value.to_bytes_be());
        Jwk {
            kty: default_kty(),
            n: number(key.n()),
            e: number(key.e()),
            d: number(key.d()),
            p: primes.first().map(number).unwrap_or_default(),
            q: primes.get(1).map(number).unwrap_or_default(),
            dp: key.dp().map(number),
            dq: key.dq().map(number),
            qi: key.crt_coefficient().as_ref().map(number),
        }
    }
}

fn jwk_number(field: &str, name: &str) -> Result<BigUint> {
    let bytes = b64url_decode(field)
        .map_err(|e| CoreError::InvalidKey(format!("JWK field {}: {}", name, e)))?;
    if bytes.is_empty() {
        return Err(CoreError::InvalidKey(format!("JWK field {} is empty", name)));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

impl Signer for Wallet {
    fn owner(&self) -> &[u8] {
        &self.owner
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signing_key = BlindedSigningKey::<Sha256>::new(self.key.clone());
        let signature = signing_key
            .try_sign_with_rng(&mut rand::thread_rng(), message)
            .map_err(|e| CoreError::Signing(e.to_string()))?;
        Ok(signature.to_vec())
    }

    fn address(&self) -> Address {
        self.address.clone()
    }
}

impl PartialEq for Wallet {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Wallet {}

impl PartialOrd for Wallet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Wallet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address.cmp(&other.address)
    }
}

impl Hash for Wallet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wallet({})", self.address)
    }
}

/// Verify an RSA-PSS (SHA-256) signature against a raw public modulus.
pub fn verify(owner: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    if owner.is_empty() {
        return Err(CoreError::InvalidKey("empty owner".into()));
    }
    let public_key = RsaPublicKey::new(
        BigUint::from_bytes_be(owner),
        BigUint::from(PUBLIC_EXPONENT),
    )
    .map_err(|e| CoreError::InvalidKey(e.to_string()))?;

    let signature = Signature::try_from(signature).map_err(|_| CoreError::InvalidSignature)?;
    VerifyingKey::<Sha256>::new(public_key)
        .verify(message, &signature)
        .map_err(|_| CoreError::InvalidSignature)
}
