//! Error types for Weavekit Core.

use thiserror::Error;

/// Core errors that can occur while building, hashing or signing transactions.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("deep hash input list is empty")]
    EmptyDeepHashList,

    #[error("transaction is already signed")]
    AlreadySigned,

    #[error("chunk index {index} out of range ({count} chunks)")]
    ChunkOutOfRange { index: usize, count: usize },

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Verification errors for signed transactions and chunk proofs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("transaction has no signature")]
    MissingSignature,

    #[error("transaction has no owner")]
    MissingOwner,

    #[error("transaction id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: String, actual: String },

    #[error("signature verification failed")]
    SignatureFailed,

    #[error("data_size {declared} does not match payload length {actual}")]
    DataSizeMismatch { declared: u64, actual: u64 },

    #[error("data_root does not match payload")]
    DataRootMismatch,

    #[error("chunk proof rejected: {0}")]
    InvalidProof(String),

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature | CoreError::InvalidKey(_) => {
                ValidationError::SignatureFailed
            }
            other => ValidationError::StructuralError(other.to_string()),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
