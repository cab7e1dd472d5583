//! The Weave: one identity talking to one gateway.
//!
//! The Weave pairs a signer with a gateway and covers the common flows:
//! posting data, sending value, and reading transactions back with
//! verification.

use std::sync::Arc;

use bytes::Bytes;
use weavekit_client::{
    Assembler, Assembly, AssemblyState, ChainInfo, ChainReader, ClientError, Gateway,
    GatewayConfig, HttpGateway, Result as ClientResult, TxStatus,
};
use weavekit_core::{
    verify_transaction, Address, Amount, Signer, Transaction, TransactionBuilder, TransactionId,
    ValidationError,
};

use crate::error::{Result, WeaveError};

/// Outcome of posting a transaction.
#[derive(Debug, Clone)]
pub struct Posted {
    pub id: TransactionId,
    /// Raw body of the commit response.
    pub response: Vec<u8>,
    /// Chunks uploaded after commit (zero when the payload was in the body).
    /// After a failed upload, the index of the first chunk not accepted.
    pub chunks_uploaded: usize,
    pub transaction: Transaction,
}

/// The main Weave struct.
pub struct Weave<G: Gateway + ChainReader> {
    /// The identity signing every transaction.
    signer: Arc<dyn Signer>,
    assembler: Assembler<G>,
}

impl Weave<HttpGateway> {
    /// Connect to an HTTP gateway.
    pub fn connect(signer: impl Signer + 'static, config: GatewayConfig) -> Result<Self> {
        let gateway = HttpGateway::new(config)?;
        Ok(Self::new(signer, gateway))
    }
}

impl<G: Gateway + ChainReader> Weave<G> {
    pub fn new(signer: impl Signer + 'static, gateway: G) -> Self {
        Self {
            signer: Arc::new(signer),
            assembler: Assembler::new(gateway),
        }
    }

    /// The signer's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn gateway(&self) -> &G {
        self.assembler.gateway()
    }

    /// The underlying assembler, for step-by-step control.
    pub fn assembler(&self) -> &Assembler<G> {
        &self.assembler
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writing
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a data transaction.
    pub fn data(&self, data: impl Into<Bytes>) -> TransactionBuilder {
        Transaction::builder().data(data)
    }

    /// Anchor, price and sign a transaction without sending it.
    pub async fn sign(&self, tx: Transaction) -> Result<Transaction> {
        let mut assembly = Assembly::new(tx);
        self.assembler
            .assemble(&mut assembly, self.signer.as_ref())
            .await?;
        Ok(assembly.into_transaction())
    }

    /// Submit an already signed transaction and upload its chunks.
    pub async fn submit(&self, tx: Transaction) -> Result<Posted> {
        let mut assembly = Assembly::new(tx);
        self.assembler.commit(&mut assembly).await?;
        let uploaded = self.assembler.upload_chunks(&assembly).await;
        finish(assembly, uploaded)
    }

    /// Assemble, sign, commit and upload a transaction.
    pub async fn post(&self, tx: Transaction) -> Result<Posted> {
        let mut assembly = Assembly::new(tx);
        let uploaded = self
            .assembler
            .post(&mut assembly, self.signer.as_ref())
            .await;
        finish(assembly, uploaded)
    }

    /// Upload the chunks a failed upload left behind, starting at
    /// `posted.chunks_uploaded`.
    pub async fn resume_upload(&self, mut posted: Posted) -> Result<Posted> {
        let start = posted.chunks_uploaded;
        match self
            .assembler
            .upload_chunks_from(&posted.transaction, start)
            .await
        {
            Ok(sent) => {
                posted.chunks_uploaded = start + sent;
                tracing::info!(id = ?posted.id, sent, "upload resumed");
                Ok(posted)
            }
            Err(ClientError::ChunkUpload { index, offset, source }) => {
                posted.chunks_uploaded = index;
                Err(WeaveError::Upload {
                    posted: Box::new(posted),
                    source: ClientError::ChunkUpload { index, offset, source },
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Post a payload as a format 2 data transaction.
    pub async fn upload(&self, data: impl Into<Bytes>) -> Result<Posted> {
        self.post(Transaction::from_data(data)).await
    }

    /// Send `quantity` to `target`.
    pub async fn transfer(&self, quantity: Amount, target: Address) -> Result<Posted> {
        self.post(Transaction::transfer(quantity, target)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reading
    // ─────────────────────────────────────────────────────────────────────────

    /// Balance of the signer's wallet.
    pub async fn balance(&self) -> Result<Amount> {
        self.balance_of(&self.address()).await
    }

    pub async fn balance_of(&self, address: &Address) -> Result<Amount> {
        Ok(self.gateway().balance(address).await?)
    }

    /// Last transaction sent from the signer's wallet, empty if none.
    pub async fn last_tx(&self) -> Result<String> {
        Ok(self.gateway().last_tx(&self.address()).await?)
    }

    pub async fn status(&self, id: &TransactionId) -> Result<TxStatus> {
        Ok(self.gateway().status(id).await?)
    }

    /// Fetch a transaction and verify its id and signature.
    pub async fn find(&self, id: &TransactionId) -> Result<Transaction> {
        let tx = self.gateway().transaction(id).await?;
        verify_transaction(&tx)?;
        if tx.id() != Some(id) {
            return Err(ValidationError::IdMismatch {
                expected: id.to_b64url(),
                actual: tx.id().map(|i| i.to_b64url()).unwrap_or_default(),
            }
            .into());
        }
        Ok(tx)
    }

    /// Payload of a transaction.
    pub async fn data_of(&self, id: &TransactionId) -> Result<Bytes> {
        Ok(self.gateway().transaction_data(id).await?)
    }

    pub async fn info(&self) -> Result<ChainInfo> {
        Ok(self.gateway().info().await?)
    }
}

/// Turn the outcome of commit plus upload into a `Posted`. A committed
/// assembly whose upload failed comes back inside [`WeaveError::Upload`].
fn finish(assembly: Assembly, uploaded: ClientResult<usize>) -> Result<Posted> {
    match uploaded {
        Ok(chunks_uploaded) => {
            tracing::info!(id = ?assembly.transaction().id(), chunks_uploaded, "posted");
            posted(assembly, chunks_uploaded)
        }
        Err(ClientError::ChunkUpload { index, offset, source })
            if assembly.state() == AssemblyState::Committed =>
        {
            let posted = posted(assembly, index)?;
            Err(WeaveError::Upload {
                posted: Box::new(posted),
                source: ClientError::ChunkUpload { index, offset, source },
            })
        }
        Err(e) => Err(e.into()),
    }
}

fn posted(assembly: Assembly, chunks_uploaded: usize) -> Result<Posted> {
    let response = assembly.response().map(<[u8]>::to_vec).unwrap_or_default();
    let transaction = assembly.into_transaction();
    let id = *transaction.id().ok_or(ClientError::MissingSignature)?;
    Ok(Posted {
        id,
        response,
        chunks_uploaded,
        transaction,
    })
}
