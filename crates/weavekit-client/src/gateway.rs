//! Collaborator contracts for the network.
//!
//! [`Gateway`] is everything the assembly pipeline needs from the network.
//! [`ChainReader`] covers the read-only endpoints. Implementations may use
//! HTTP (see [`crate::http`]) or anything else; [`memory`] is a recording
//! stub for tests.

use async_trait::async_trait;
use bytes::Bytes;
use weavekit_core::{Address, Amount, ChunkUpload, Transaction, TransactionId};

use crate::error::GatewayError;
use crate::types::{ChainInfo, TxStatus};

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// The network side of transaction assembly.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch a recent anchor (base64url).
    async fn anchor(&self) -> Result<String>;

    /// Quote the fee for storing `bytes` bytes, optionally paying `target`.
    async fn price(&self, bytes: u64, target: Option<&Address>) -> Result<Amount>;

    /// Submit a signed transaction. Returns the raw response body.
    async fn submit(&self, tx: &Transaction) -> Result<Vec<u8>>;

    /// Upload one chunk of a committed payload.
    async fn post_chunk(&self, chunk: &ChunkUpload) -> Result<()>;
}

/// Read-only network queries.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Confirmation status of a transaction.
    async fn status(&self, id: &TransactionId) -> Result<TxStatus>;

    /// Look up a transaction. The chunk bundle is never part of it.
    async fn transaction(&self, id: &TransactionId) -> Result<Transaction>;

    /// The payload of a transaction.
    async fn transaction_data(&self, id: &TransactionId) -> Result<Bytes>;

    /// Balance of a wallet.
    async fn balance(&self, address: &Address) -> Result<Amount>;

    /// Id of the last transaction sent from a wallet, empty if none.
    async fn last_tx(&self, address: &Address) -> Result<String>;

    /// Node information.
    async fn info(&self) -> Result<ChainInfo>;
}

/// An in-memory gateway for testing.
///
/// Records every call, verifies what it is sent the way a node would, and
/// can be told to fail specific calls.
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use weavekit_core::{b64url_decode, validate_chunk, verify_transaction, TransactionJson};

    use crate::types::StatusData;

    /// A gateway call that can be counted or made to fail.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Call {
        Anchor,
        Price,
        Submit,
        PostChunk,
    }

    #[derive(Default)]
    struct State {
        anchor: String,
        price: Amount,
        failing: HashSet<Call>,
        calls: HashMap<Call, usize>,
        submitted: Vec<Transaction>,
        chunks: Vec<ChunkUpload>,
        confirmations: HashMap<TransactionId, StatusData>,
        balances: HashMap<Address, Amount>,
    }

    impl State {
        fn record(&mut self, call: Call) -> Result<()> {
            *self.calls.entry(call).or_default() += 1;
            if self.failing.contains(&call) {
                return Err(GatewayError::Status {
                    status: 500,
                    body: format!("injected {:?} failure", call),
                });
            }
            Ok(())
        }

        fn find(&self, id: &TransactionId) -> Option<&Transaction> {
            self.submitted.iter().find(|tx| tx.id() == Some(id))
        }
    }

    fn rejected(body: impl ToString) -> GatewayError {
        GatewayError::Status {
            status: 400,
            body: body.to_string(),
        }
    }

    fn not_found(id: &TransactionId) -> GatewayError {
        GatewayError::Status {
            status: 404,
            body: format!("{} not found", id),
        }
    }

    /// Shared-state stub. Clones observe the same state.
    #[derive(Clone, Default)]
    pub struct MemoryGateway {
        state: Arc<Mutex<State>>,
    }

    impl MemoryGateway {
        /// A gateway answering every anchor and price request with fixed values.
        pub fn new(anchor: impl Into<String>, price: Amount) -> Self {
            let state = State {
                anchor: anchor.into(),
                price,
                ..State::default()
            };
            Self {
                state: Arc::new(Mutex::new(state)),
            }
        }

        pub async fn set_anchor(&self, anchor: impl Into<String>) {
            self.state.lock().await.anchor = anchor.into();
        }

        pub async fn set_price(&self, price: Amount) {
            self.state.lock().await.price = price;
        }

        /// Make every subsequent `call` fail with a 500.
        pub async fn fail_on(&self, call: Call) {
            self.state.lock().await.failing.insert(call);
        }

        /// Undo [`fail_on`](Self::fail_on).
        pub async fn recover(&self, call: Call) {
            self.state.lock().await.failing.remove(&call);
        }

        /// Times `call` was invoked, failed attempts included.
        pub async fn calls(&self, call: Call) -> usize {
            self.state.lock().await.calls.get(&call).copied().unwrap_or(0)
        }

        /// Total gateway calls of any kind.
        pub async fn total_calls(&self) -> usize {
            self.state.lock().await.calls.values().sum()
        }

        /// Accepted submissions, in order.
        pub async fn submitted(&self) -> Vec<Transaction> {
            self.state.lock().await.submitted.clone()
        }

        /// Accepted chunk uploads, in order.
        pub async fn uploaded_chunks(&self) -> Vec<ChunkUpload> {
            self.state.lock().await.chunks.clone()
        }

        /// Mark a submitted transaction as mined.
        pub async fn confirm(&self, id: &TransactionId, block_height: u64) {
            let data = StatusData {
                block_height,
                block_indep_hash: format!("block-{}", block_height),
                number_of_confirmations: 1,
            };
            self.state.lock().await.confirmations.insert(*id, data);
        }

        pub async fn set_balance(&self, address: Address, amount: Amount) {
            self.state.lock().await.balances.insert(address, amount);
        }
    }

    #[async_trait]
    impl Gateway for MemoryGateway {
        async fn anchor(&self) -> Result<String> {
            let mut state = self.state.lock().await;
            state.record(Call::Anchor)?;
            Ok(state.anchor.clone())
        }

        async fn price(&self, _bytes: u64, _target: Option<&Address>) -> Result<Amount> {
            let mut state = self.state.lock().await;
            state.record(Call::Price)?;
            Ok(state.price)
        }

        async fn submit(&self, tx: &Transaction) -> Result<Vec<u8>> {
            let mut state = self.state.lock().await;
            state.record(Call::Submit)?;
            verify_transaction(tx).map_err(rejected)?;
            state.submitted.push(tx.clone());
            Ok(b"OK".to_vec())
        }

        async fn post_chunk(&self, chunk: &ChunkUpload) -> Result<()> {
            let mut state = self.state.lock().await;
            state.record(Call::PostChunk)?;

            let data_root = b64url_decode(&chunk.data_root).map_err(rejected)?;
            let known = state.submitted.iter().any(|tx| tx.data_root() == data_root.as_slice());
            if !known {
                return Err(rejected("no transaction with this data_root"));
            }

            let data_size = chunk.data_size.parse::<u64>().map_err(rejected)?;
            let offset = chunk.offset.parse::<u64>().map_err(rejected)?;
            let path = b64url_decode(&chunk.data_path).map_err(rejected)?;
            let bytes = b64url_decode(&chunk.chunk).map_err(rejected)?;
            validate_chunk(&data_root, data_size, offset, &path, &bytes).map_err(rejected)?;

            state.chunks.push(chunk.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl ChainReader for MemoryGateway {
        async fn status(&self, id: &TransactionId) -> Result<TxStatus> {
            let state = self.state.lock().await;
            if let Some(data) = state.confirmations.get(id) {
                return Ok(TxStatus::Accepted(data.clone()));
            }
            Ok(match state.find(id) {
                Some(_) => TxStatus::Pending,
                None => TxStatus::NotFound,
            })
        }

        async fn transaction(&self, id: &TransactionId) -> Result<Transaction> {
            let state = self.state.lock().await;
            let tx = state.find(id).ok_or_else(|| not_found(id))?;
            // Hand back what a node would serve
            Transaction::try_from(TransactionJson::from(tx))
                .map_err(|e| GatewayError::Decode(e.to_string()))
        }

        async fn transaction_data(&self, id: &TransactionId) -> Result<Bytes> {
            let state = self.state.lock().await;
            let tx = state.find(id).ok_or_else(|| not_found(id))?;
            Ok(tx.data().clone())
        }

        async fn balance(&self, address: &Address) -> Result<Amount> {
            let state = self.state.lock().await;
            Ok(state.balances.get(address).copied().unwrap_or_default())
        }

        async fn last_tx(&self, address: &Address) -> Result<String> {
            let state = self.state.lock().await;
            Ok(state
                .submitted
                .iter()
                .rev()
                .find(|tx| tx.owner_address().as_ref() == Some(address))
                .and_then(|tx| tx.id())
                .map(|id| id.to_b64url())
                .unwrap_or_default())
        }

        async fn info(&self) -> Result<ChainInfo> {
            let state = self.state.lock().await;
            let height = state
                .confirmations
                .values()
                .map(|d| d.block_height)
                .max()
                .unwrap_or(0);
            Ok(ChainInfo {
                network: "memory".to_string(),
                version: 5,
                release: 1,
                height,
                current: format!("block-{}", height),
                blocks: height + 1,
                peers: 0,
                queue_length: state.submitted.len().saturating_sub(state.confirmations.len()) as u64,
                node_state_latency: 0,
            })
        }
    }
}
