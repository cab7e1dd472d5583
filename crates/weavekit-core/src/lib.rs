//! # Weavekit Core
//!
//! Pure primitives for committing transactions to a blockweave ledger:
//! deep hashing, payload chunking with Merkle proofs, RSA-PSS identities and
//! the transaction entity itself.
//!
//! This crate contains no I/O and no networking. It is pure computation over
//! cryptographic data structures; the network-facing pipeline lives in
//! `weavekit-client`.
//!
//! ## Key Types
//!
//! - [`Transaction`] - The unit of ledger interaction, one type for both formats
//! - [`Chunks`] - Chunk bundle: data root, chunk ranges and one proof per chunk
//! - [`Wallet`] - Software RSA-PSS identity implementing [`Signer`]
//! - [`Address`] / [`TransactionId`] - Hash-derived identifiers
//! - [`Amount`] - Winston-denominated quantities
//!
//! ## Canonicalization
//!
//! The signed message of a transaction is a deep hash over its canonical
//! field list. See [`deep_hash`] and [`Transaction::signature_data`].

pub mod amount;
pub mod crypto;
pub mod deep_hash;
pub mod error;
pub mod merkle;
pub mod transaction;
pub mod types;
pub mod validation;
pub mod wallet;
pub mod wire;

pub use amount::{Amount, Unit, WINSTON_PER_AR};
pub use crypto::{b64url_decode, b64url_encode, Sha256Hash, Sha384Hash};
pub use deep_hash::{deep_hash, deep_hash_blob, deep_hash_list, DeepHashItem};
pub use error::{CoreError, Result, ValidationError};
pub use merkle::{
    generate_transaction_chunks, validate_path, Chunk, Chunks, Proof, ValidatedPath, MAX_CHUNK_SIZE,
    MIN_CHUNK_SIZE,
};
pub use transaction::{Format, PriceRequest, Tag, Transaction, TransactionBuilder};
pub use types::{Address, TransactionId};
pub use validation::{validate_chunk, verify_transaction};
pub use wallet::{verify, Jwk, Signer, Wallet};
pub use wire::{ChunkUpload, TransactionJson};
