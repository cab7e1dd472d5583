//! JSON wire shapes.
//!
//! Binary fields are unpadded base64url, numeric fields decimal strings and
//! `format` a bare integer. The chunk bundle is local state and never
//! appears here.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::crypto::{b64url_decode, b64url_encode};
use crate::error::{CoreError, Result};
use crate::transaction::{Format, Tag, Transaction};
use crate::types::{Address, TransactionId};

fn default_format() -> u8 {
    1
}

fn zero() -> String {
    "0".to_string()
}

/// A transaction as submitted to and returned by a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionJson {
    #[serde(default = "default_format")]
    pub format: u8,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub last_tx: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub target: String,
    #[serde(default = "zero")]
    pub quantity: String,
    #[serde(default)]
    pub data: String,
    #[serde(default = "zero")]
    pub data_size: String,
    #[serde(default)]
    pub data_root: String,
    #[serde(default)]
    pub reward: String,
    #[serde(default)]
    pub signature: String,
}

impl From<&Transaction> for TransactionJson {
    fn from(tx: &Transaction) -> Self {
        let data = if tx.data_in_body() {
            b64url_encode(&tx.data)
        } else {
            String::new()
        };

        Self {
            format: tx.format.into(),
            id: tx.id.map(|id| id.to_b64url()).unwrap_or_default(),
            last_tx: b64url_encode(&tx.last_tx),
            owner: b64url_encode(&tx.owner),
            tags: tx.tags.clone(),
            target: tx
                .target
                .as_ref()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            quantity: tx.quantity.to_string(),
            data,
            data_size: tx.data_size.to_string(),
            data_root: b64url_encode(&tx.data_root),
            reward: tx.reward.map(|r| r.to_string()).unwrap_or_default(),
            signature: b64url_encode(&tx.signature),
        }
    }
}

impl TryFrom<TransactionJson> for Transaction {
    type Error = CoreError;

    fn try_from(json: TransactionJson) -> Result<Self> {
        let format = Format::try_from(json.format)?;
        let id = non_empty(&json.id)
            .map(TransactionId::from_b64url)
            .transpose()?;
        let target = non_empty(&json.target).map(Address::parse).transpose()?;
        let quantity = non_empty(&json.quantity)
            .map(str::parse::<Amount>)
            .transpose()?
            .unwrap_or_default();
        let reward = non_empty(&json.reward)
            .map(str::parse::<Amount>)
            .transpose()?;

        let data = b64url_decode(&json.data)?;
        let data_size = match non_empty(&json.data_size) {
            Some(s) => s.parse::<u64>().map_err(|e| {
                CoreError::MalformedTransaction(format!("data_size {:?}: {}", s, e))
            })?,
            None => data.len() as u64,
        };
        let data_root = b64url_decode(&json.data_root)?;

        if format == Format::V1 && !data_root.is_empty() {
            return Err(CoreError::MalformedTransaction(
                "format 1 transaction declares a data_root".into(),
            ));
        }
        if !data.is_empty() && data.len() as u64 != data_size {
            return Err(CoreError::MalformedTransaction(format!(
                "inline data of {} bytes but data_size {}",
                data.len(),
                data_size
            )));
        }

        Ok(Transaction {
            format,
            id,
            last_tx: b64url_decode(&json.last_tx)?,
            owner: b64url_decode(&json.owner)?,
            tags: json.tags,
            target,
            quantity,
            data: data.into(),
            data_size,
            data_root,
            reward,
            signature: b64url_decode(&json.signature)?,
            chunks: None,
        })
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// Upload body for one chunk of a committed format 2 payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkUpload {
    /// base64url Merkle root of the payload.
    pub data_root: String,
    /// Total payload size, decimal.
    pub data_size: String,
    /// base64url serialized Merkle proof.
    pub data_path: String,
    /// Last byte offset of the chunk, decimal.
    pub offset: String,
    /// base64url chunk bytes.
    pub chunk: String,
}
