//! Error types for gateway access and transaction assembly.

use thiserror::Error;
use weavekit_core::CoreError;

/// Errors raised by a gateway collaborator.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be interpreted.
    #[error("decode error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// The HTTP status, if the gateway answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Transport(e) => e.status().map(|s| s.as_u16()),
            GatewayError::Decode(_) => None,
        }
    }
}

/// Errors raised while assembling and committing a transaction.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("anchor fetch failed: {0}")]
    Anchor(#[source] GatewayError),

    #[error("price fetch failed: {0}")]
    Price(#[source] GatewayError),

    #[error("signing failed: {0}")]
    Sign(#[source] CoreError),

    #[error("commit failed: {0}")]
    Commit(#[source] GatewayError),

    /// Chunks before `index` were accepted.
    #[error("chunk upload {index} at offset {offset} failed: {source}")]
    ChunkUpload {
        index: usize,
        offset: String,
        #[source]
        source: GatewayError,
    },

    /// Local validation: nothing was sent.
    #[error("missing signature on transaction")]
    MissingSignature,

    /// Local validation: the payload behind `data_size` is not held, so it
    /// could never reach the gateway.
    #[error("payload of {data_size} bytes is not held")]
    MissingPayload { data_size: u64 },

    /// A step was called out of order.
    #[error("invalid assembly state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: String,
    },

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
