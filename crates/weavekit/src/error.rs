//! Error types for the Weave facade.

use thiserror::Error;
use weavekit_client::{ClientError, GatewayError};
use weavekit_core::{CoreError, ValidationError};

use crate::weave::Posted;

/// Errors that can occur during facade operations.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// Assembly or commit failed.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// The transaction was committed but a chunk upload failed.
    ///
    /// `posted.chunks_uploaded` is the chunk to resume from with
    /// [`Weave::resume_upload`](crate::Weave::resume_upload).
    #[error("transaction {} committed, chunk upload failed: {source}", .posted.id)]
    Upload {
        posted: Box<Posted>,
        #[source]
        source: ClientError,
    },

    /// A read endpoint failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A fetched transaction did not verify.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Local construction failed.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, WeaveError>;
