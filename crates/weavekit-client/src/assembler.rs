//! Transaction assembly: sequencing network inputs with local signing.
//!
//! ## State Machine
//!
//! ```text
//! Draft --anchor--> Anchored --price--> Priced --sign--> Signed --commit--> Committed
//!   |                  |                   |                |
//!   +------------------+-------------------+----------------+--> Failed(reason)
//! ```
//!
//! Each step runs only from its predecessor state. A failed step moves the
//! assembly to [`AssemblyState::Failed`], which is terminal: start over with
//! [`Assembly::retry`], which keeps the computed chunk bundle. Nothing is
//! retried internally.

use std::fmt;

use weavekit_core::{Format, Signer, Transaction};

use crate::error::{ClientError, GatewayError, Result};
use crate::gateway::Gateway;

/// The step at which an assembly failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    Anchor,
    Price,
    Sign,
    Commit,
}

/// Where an assembly stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssemblyState {
    Draft,
    Anchored,
    Priced,
    Signed,
    Committed,
    Failed(FailureReason),
}

impl AssemblyState {
    pub fn is_failed(&self) -> bool {
        matches!(self, AssemblyState::Failed(_))
    }
}

impl fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyState::Draft => f.write_str("draft"),
            AssemblyState::Anchored => f.write_str("anchored"),
            AssemblyState::Priced => f.write_str("priced"),
            AssemblyState::Signed => f.write_str("signed"),
            AssemblyState::Committed => f.write_str("committed"),
            AssemblyState::Failed(reason) => write!(f, "failed({:?})", reason),
        }
    }
}

/// One transaction on its way through the pipeline.
#[derive(Debug, Clone)]
pub struct Assembly {
    tx: Transaction,
    state: AssemblyState,
    response: Option<Vec<u8>>,
}

impl Assembly {
    /// Start from a transaction. An already signed one starts as `Signed`.
    pub fn new(tx: Transaction) -> Self {
        let state = if tx.is_signed() {
            AssemblyState::Signed
        } else {
            AssemblyState::Draft
        };
        Self {
            tx,
            state,
            response: None,
        }
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn into_transaction(self) -> Transaction {
        self.tx
    }

    /// Body of the commit response, once committed.
    pub fn response(&self) -> Option<&[u8]> {
        self.response.as_deref()
    }

    /// A fresh draft of the same payload. Anchor, price and signature are
    /// dropped; the chunk bundle is kept.
    ///
    /// Only an unsigned or failed assembly can be retried. A signed one may
    /// already be on the network.
    pub fn retry(&self) -> Result<Self> {
        match self.state {
            AssemblyState::Signed | AssemblyState::Committed => Err(ClientError::InvalidState {
                expected: "unsigned or failed",
                found: self.state.to_string(),
            }),
            _ => Ok(Self::new(self.tx.clone().into_draft())),
        }
    }

    fn require(&self, expected: AssemblyState, name: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(ClientError::InvalidState {
                expected: name,
                found: self.state.to_string(),
            });
        }
        Ok(())
    }

    fn fail(&mut self, reason: FailureReason) {
        tracing::warn!(?reason, "transaction assembly failed");
        self.state = AssemblyState::Failed(reason);
    }
}

/// Drives assemblies against a gateway.
pub struct Assembler<G: Gateway> {
    gateway: G,
}

impl<G: Gateway> Assembler<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Draft -> Anchored: fetch and set the anchor.
    pub async fn anchor(&self, assembly: &mut Assembly) -> Result<()> {
        assembly.require(AssemblyState::Draft, "draft")?;

        let anchored = match self.gateway.anchor().await {
            Ok(anchor) => assembly
                .tx
                .set_anchor(&anchor)
                .map_err(|e| GatewayError::Decode(format!("anchor: {}", e))),
            Err(e) => Err(e),
        };
        if let Err(e) = anchored {
            assembly.fail(FailureReason::Anchor);
            return Err(ClientError::Anchor(e));
        }

        tracing::debug!("anchored");
        assembly.state = AssemblyState::Anchored;
        Ok(())
    }

    /// Anchored -> Priced: prepare chunks, then quote and set the reward.
    pub async fn price(&self, assembly: &mut Assembly) -> Result<()> {
        assembly.require(AssemblyState::Anchored, "anchored")?;

        if let Err(e) = assembly.tx.prepare_chunks() {
            assembly.fail(FailureReason::Price);
            return Err(ClientError::Core(e));
        }

        let request = assembly.tx.price_request();
        let reward = match self.gateway.price(request.bytes, request.target.as_ref()).await {
            Ok(reward) => reward,
            Err(e) => {
                assembly.fail(FailureReason::Price);
                return Err(ClientError::Price(e));
            }
        };
        if let Err(e) = assembly.tx.set_reward(reward) {
            assembly.fail(FailureReason::Price);
            return Err(ClientError::Core(e));
        }

        tracing::debug!(bytes = request.bytes, %reward, "priced");
        assembly.state = AssemblyState::Priced;
        Ok(())
    }

    /// Priced -> Signed: sign the canonical message and derive the id.
    pub fn sign(&self, assembly: &mut Assembly, signer: &dyn Signer) -> Result<()> {
        assembly.require(AssemblyState::Priced, "priced")?;

        if let Err(e) = assembly.tx.sign(signer) {
            assembly.fail(FailureReason::Sign);
            return Err(ClientError::Sign(e));
        }

        tracing::debug!(id = ?assembly.tx.id(), "signed");
        assembly.state = AssemblyState::Signed;
        Ok(())
    }

    /// Signed -> Committed: submit exactly once.
    ///
    /// An unsigned transaction, or a format 2 one whose payload is not held,
    /// is rejected locally before anything is sent, and the assembly is left
    /// as it was. A transaction that arrives without its chunk bundle gets
    /// one computed and checked against its signed `data_root`.
    pub async fn commit(&self, assembly: &mut Assembly) -> Result<()> {
        if !assembly.tx.is_signed() {
            return Err(ClientError::MissingSignature);
        }
        assembly.require(AssemblyState::Signed, "signed")?;

        let tx = &mut assembly.tx;
        if tx.format() == Format::V2 && tx.data_size() > 0 {
            if tx.data().len() as u64 != tx.data_size() {
                return Err(ClientError::MissingPayload {
                    data_size: tx.data_size(),
                });
            }
            tx.prepare_chunks()?;
        }

        match self.gateway.submit(&assembly.tx).await {
            Ok(response) => {
                tracing::debug!(id = ?assembly.tx.id(), "committed");
                assembly.response = Some(response);
                assembly.state = AssemblyState::Committed;
                Ok(())
            }
            Err(e) => {
                assembly.fail(FailureReason::Commit);
                Err(ClientError::Commit(e))
            }
        }
    }

    /// Run every step up to `Signed`, starting from wherever the assembly is.
    pub async fn assemble(&self, assembly: &mut Assembly, signer: &dyn Signer) -> Result<()> {
        if assembly.state == AssemblyState::Draft {
            self.anchor(assembly).await?;
        }
        if assembly.state == AssemblyState::Anchored {
            self.price(assembly).await?;
        }
        if assembly.state == AssemblyState::Priced {
            self.sign(assembly, signer)?;
        }
        assembly.require(AssemblyState::Signed, "signed")
    }

    /// Assemble, commit and upload chunks.
    pub async fn post(&self, assembly: &mut Assembly, signer: &dyn Signer) -> Result<usize> {
        self.assemble(assembly, signer).await?;
        self.commit(assembly).await?;
        self.upload_chunks(assembly).await
    }

    /// Upload every chunk of a committed payload that did not travel in the
    /// transaction body. Returns the number of chunks sent.
    pub async fn upload_chunks(&self, assembly: &Assembly) -> Result<usize> {
        assembly.require(AssemblyState::Committed, "committed")?;
        self.upload_chunks_from(&assembly.tx, 0).await
    }

    /// Upload the chunks of an already committed transaction, starting at
    /// chunk `start`. Returns the number of chunks sent.
    ///
    /// This resumes an upload interrupted by [`ClientError::ChunkUpload`],
    /// whose `index` is the chunk to start from.
    pub async fn upload_chunks_from(&self, tx: &Transaction, start: usize) -> Result<usize> {
        if tx.data_in_body() && tx.data().len() as u64 == tx.data_size() {
            return Ok(0);
        }
        let count = tx
            .chunks()
            .map(|c| c.len())
            .ok_or(ClientError::MissingPayload {
                data_size: tx.data_size(),
            })?;

        for index in start..count {
            let upload = tx.chunk_upload(index)?;
            if let Err(source) = self.gateway.post_chunk(&upload).await {
                tracing::warn!(index, offset = %upload.offset, "chunk upload failed");
                return Err(ClientError::ChunkUpload {
                    index,
                    offset: upload.offset,
                    source,
                });
            }
        }

        let sent = count.saturating_sub(start);
        tracing::debug!(sent, "chunks uploaded");
        Ok(sent)
    }
}
