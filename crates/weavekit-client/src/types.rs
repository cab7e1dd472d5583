//! Response types of the read endpoints.

use serde::{Deserialize, Serialize};

/// Confirmation details of an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    pub block_height: u64,
    pub block_indep_hash: String,
    pub number_of_confirmations: u64,
}

/// Where a transaction stands on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Mined (200).
    Accepted(StatusData),
    /// Known but not yet mined (202).
    Pending,
    /// Unknown to the gateway (404).
    NotFound,
    /// Any other status code.
    Unknown(u16),
}

impl TxStatus {
    /// Map a non-200 status code.
    pub fn from_code(code: u16) -> Self {
        match code {
            202 => TxStatus::Pending,
            404 => TxStatus::NotFound,
            other => TxStatus::Unknown(other),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TxStatus::Accepted(_))
    }
}

/// Node information from `GET /info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub network: String,
    pub version: u64,
    pub release: u64,
    pub height: u64,
    pub current: String,
    pub blocks: u64,
    pub peers: u64,
    pub queue_length: u64,
    pub node_state_latency: u64,
}
