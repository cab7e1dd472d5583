//! The transaction entity.
//!
//! A [`Transaction`] moves through draft, anchored, priced and signed. Until
//! it is signed every field may change; signing freezes it and derives
//! `id = SHA-256(signature)`.
//!
//! ## Formats
//!
//! - [`Format::V1`] carries its payload inline and signs over it directly.
//! - [`Format::V2`] signs over `data_size` and the Merkle `data_root` of the
//!   payload instead, so large payloads can be uploaded as verifiable chunks.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::crypto::{b64url_decode, b64url_encode, Sha384Hash};
use crate::deep_hash::{deep_hash_list, DeepHashItem};
use crate::error::{CoreError, Result};
use crate::merkle::{generate_transaction_chunks, Chunks, MAX_CHUNK_SIZE};
use crate::types::{Address, TransactionId};
use crate::wallet::Signer;
use crate::wire::ChunkUpload;

/// Transaction format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Format {
    V1 = 1,
    #[default]
    V2 = 2,
}

impl TryFrom<u8> for Format {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Format::V1),
            2 => Ok(Format::V2),
            other => Err(CoreError::MalformedTransaction(format!(
                "unknown format {}",
                other
            ))),
        }
    }
}

impl From<Format> for u8 {
    fn from(format: Format) -> Self {
        format as u8
    }
}

/// A metadata pair. Tag order is part of the signed message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Inputs of a fee quote: payload size and optional recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
    pub bytes: u64,
    pub target: Option<Address>,
}

/// A ledger transaction.
///
/// Fields are read through accessors; mutation goes through methods that
/// refuse to touch a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub(crate) format: Format,
    pub(crate) id: Option<TransactionId>,
    pub(crate) last_tx: Vec<u8>,
    pub(crate) owner: Vec<u8>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) target: Option<Address>,
    pub(crate) quantity: Amount,
    pub(crate) data: Bytes,
    pub(crate) data_size: u64,
    pub(crate) data_root: Vec<u8>,
    pub(crate) reward: Option<Amount>,
    pub(crate) signature: Vec<u8>,
    /// Local chunk bundle, never serialized.
    pub(crate) chunks: Option<Chunks>,
}

impl Transaction {
    /// A format 2 data transaction.
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        TransactionBuilder::new().data(data).build()
    }

    /// A format 2 value transfer with no payload.
    pub fn transfer(quantity: Amount, target: Address) -> Self {
        TransactionBuilder::new().target(target).quantity(quantity).build()
    }

    /// Start building a transaction.
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::new()
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn format(&self) -> Format {
        self.format
    }

    /// The id, present once signed.
    pub fn id(&self) -> Option<&TransactionId> {
        self.id.as_ref()
    }

    /// The anchor bytes.
    pub fn last_tx(&self) -> &[u8] {
        &self.last_tx
    }

    /// The signer's public modulus, empty until signed.
    pub fn owner(&self) -> &[u8] {
        &self.owner
    }

    /// The signer's address, once an owner is set.
    pub fn owner_address(&self) -> Option<Address> {
        (!self.owner.is_empty()).then(|| Address::from_owner(&self.owner))
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn target(&self) -> Option<&Address> {
        self.target.as_ref()
    }

    pub fn quantity(&self) -> Amount {
        self.quantity
    }

    pub fn reward(&self) -> Option<Amount> {
        self.reward
    }

    /// The payload bytes held locally.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// The Merkle root bytes, empty for format 1 or an empty payload.
    pub fn data_root(&self) -> &[u8] {
        &self.data_root
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn chunks(&self) -> Option<&Chunks> {
        self.chunks.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Whether the payload travels in the transaction body.
    ///
    /// Format 1 always carries it. Format 2 carries it only while it fits in
    /// a single chunk; larger payloads are uploaded chunk by chunk.
    pub fn data_in_body(&self) -> bool {
        match self.format {
            Format::V1 => true,
            Format::V2 => self.data.len() <= MAX_CHUNK_SIZE,
        }
    }

    /// Payload size and recipient of a fee quote.
    pub fn price_request(&self) -> PriceRequest {
        PriceRequest {
            bytes: self.data_size,
            target: self.target.clone(),
        }
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    fn ensure_unsigned(&self) -> Result<()> {
        if self.is_signed() {
            return Err(CoreError::AlreadySigned);
        }
        Ok(())
    }

    pub fn add_tag(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.ensure_unsigned()?;
        self.tags.push(Tag::new(name, value));
        Ok(())
    }

    /// Set the anchor from its base64url wire form.
    pub fn set_anchor(&mut self, anchor: &str) -> Result<()> {
        self.ensure_unsigned()?;
        self.last_tx = b64url_decode(anchor.trim())?;
        Ok(())
    }

    pub fn set_reward(&mut self, reward: Amount) -> Result<()> {
        self.ensure_unsigned()?;
        self.reward = Some(reward);
        Ok(())
    }

    /// Compute the chunk bundle and `data_root` of a format 2 payload.
    ///
    /// Idempotent. Format 1 transactions have no chunks. A transaction that
    /// already declares a root (one decoded from the wire) must match it.
    pub fn prepare_chunks(&mut self) -> Result<()> {
        if self.chunks.is_some() || self.format == Format::V1 {
            return Ok(());
        }
        if self.data.len() as u64 != self.data_size {
            return Err(CoreError::MalformedTransaction(format!(
                "payload of {} bytes held for data_size {}",
                self.data.len(),
                self.data_size
            )));
        }

        let chunks = generate_transaction_chunks(&self.data);
        let root = chunks.data_root_bytes();
        if self.data_root.is_empty() {
            if !root.is_empty() {
                self.ensure_unsigned()?;
            }
            self.data_root = root.to_vec();
        } else if self.data_root != root {
            return Err(CoreError::MalformedTransaction(
                "data_root does not match payload".into(),
            ));
        }
        self.chunks = Some(chunks);
        Ok(())
    }

    /// The message that gets signed: a deep hash over the canonical fields.
    ///
    /// Fields are taken in order and an empty field is left out entirely.
    pub fn signature_data(&self) -> Result<Sha384Hash> {
        if self.format == Format::V2 && !self.data.is_empty() && self.data_root.is_empty() {
            return Err(CoreError::MalformedTransaction(
                "data_root not computed, call prepare_chunks first".into(),
            ));
        }

        let format = u8::from(self.format).to_string();
        let target = self.target.as_ref().map(Address::to_bytes).unwrap_or_default();
        let quantity = self.quantity.to_string();
        let reward = self.reward.map(|r| r.to_string()).unwrap_or_default();
        let tags: String = self
            .tags
            .iter()
            .flat_map(|t| [t.name.as_str(), t.value.as_str()])
            .collect();
        let data_size = self.data_size.to_string();

        let mut fields: Vec<&[u8]> = vec![
            format.as_bytes(),
            self.owner.as_slice(),
            target.as_slice(),
            quantity.as_bytes(),
            reward.as_bytes(),
            self.last_tx.as_slice(),
            tags.as_bytes(),
        ];
        match self.format {
            Format::V1 => fields.push(self.data.as_ref()),
            Format::V2 => {
                fields.push(data_size.as_bytes());
                fields.push(self.data_root.as_slice());
            }
        }

        let items: Vec<DeepHashItem<'_>> = fields
            .into_iter()
            .filter(|field| !field.is_empty())
            .map(DeepHashItem::Blob)
            .collect();
        deep_hash_list(&items)
    }

    /// Sign with the given identity and derive the id.
    ///
    /// Sets `owner` from the signer, prepares chunks if needed, then signs
    /// [`signature_data`](Self::signature_data). A signed transaction is
    /// never re-signed.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<()> {
        self.ensure_unsigned()?;
        self.owner = signer.owner().to_vec();
        self.prepare_chunks()?;

        let message = self.signature_data()?;
        let signature = signer.sign(message.as_ref())?;
        if signature.is_empty() {
            return Err(CoreError::Signing("signer returned an empty signature".into()));
        }

        self.id = Some(TransactionId::from_signature(&signature));
        self.signature = signature;
        Ok(())
    }

    /// Drop the network-derived and signed fields, keeping the payload,
    /// metadata and chunk bundle.
    pub fn into_draft(mut self) -> Self {
        self.id = None;
        self.signature.clear();
        self.owner.clear();
        self.last_tx.clear();
        self.reward = None;
        self
    }

    /// The upload body for one chunk of a format 2 payload.
    pub fn chunk_upload(&self, index: usize) -> Result<ChunkUpload> {
        let chunks = self.chunks.as_ref().ok_or_else(|| {
            CoreError::MalformedTransaction("chunks not prepared".into())
        })?;
        let (chunk, proof) = chunks
            .chunks
            .get(index)
            .zip(chunks.proofs.get(index))
            .ok_or(CoreError::ChunkOutOfRange {
                index,
                count: chunks.len(),
            })?;

        Ok(ChunkUpload {
            data_root: b64url_encode(&self.data_root),
            data_size: self.data_size.to_string(),
            data_path: b64url_encode(&proof.proof),
            offset: proof.offset.to_string(),
            chunk: b64url_encode(&self.data[chunk.range()]),
        })
    }
}

/// Builder for unsigned transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    format: Format,
    data: Bytes,
    target: Option<Address>,
    quantity: Amount,
    tags: Vec<Tag>,
    reward: Option<Amount>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn target(mut self, target: Address) -> Self {
        self.target = Some(target);
        self
    }

    pub fn quantity(mut self, quantity: Amount) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(name, value));
        self
    }

    pub fn reward(mut self, reward: Amount) -> Self {
        self.reward = Some(reward);
        self
    }

    pub fn build(self) -> Transaction {
        Transaction {
            format: self.format,
            id: None,
            last_tx: Vec::new(),
            owner: Vec::new(),
            tags: self.tags,
            target: self.target,
            quantity: self.quantity,
            data_size: self.data.len() as u64,
            data: self.data,
            data_root: Vec::new(),
            reward: self.reward,
            signature: Vec::new(),
            chunks: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Sha256Hash;
    use crate::merkle::{validate_path, MIN_CHUNK_SIZE};
    use crate::wallet::test_keys::wallet;
    use crate::wallet::verify;

    const ANCHOR: &str = "aGVsbG8td29ybGQtYW5jaG9yLWZvci10ZXN0cy0wMDAwMDAwMDAwMDAwMDAw";

    fn priced(mut tx: Transaction) -> Transaction {
        tx.set_anchor(ANCHOR).unwrap();
        tx.set_reward(Amount::from_winston(1_000)).unwrap();
        tx
    }

    #[test]
    fn test_hello_world_fields() {
        let mut tx = Transaction::from_data(&b"hello world"[..]);
        assert_eq!(tx.data_size(), 11);
        assert_eq!(tx.format(), Format::V2);

        tx.prepare_chunks().unwrap();
        let chunks = tx.chunks().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks.chunks[0].range(), 0..11);
        assert_eq!(tx.data_root(), chunks.data_root_bytes());
    }

    #[test]
    fn test_sign_derives_id_from_signature() {
        let wallet = wallet();
        let mut tx = priced(Transaction::from_data(&b"hello world"[..]));
        tx.sign(&wallet).unwrap();

        assert!(tx.is_signed());
        assert_eq!(tx.owner(), wallet.owner());
        assert_eq!(tx.owner_address().as_ref(), Some(wallet.address()));
        let id = tx.id().unwrap();
        assert_eq!(id.as_bytes(), Sha256Hash::hash(tx.signature()).as_bytes());

        let message = tx.signature_data().unwrap();
        assert!(verify(tx.owner(), message.as_ref(), tx.signature()).is_ok());
    }

    #[test]
    fn test_signed_transaction_is_frozen() {
        let mut tx = priced(Transaction::from_data(&b"payload"[..]));
        tx.sign(&wallet()).unwrap();

        assert!(matches!(tx.sign(&wallet()), Err(CoreError::AlreadySigned)));
        assert!(matches!(tx.add_tag("k", "v"), Err(CoreError::AlreadySigned)));
        assert!(matches!(tx.set_anchor(ANCHOR), Err(CoreError::AlreadySigned)));
        assert!(matches!(
            tx.set_reward(Amount::ZERO),
            Err(CoreError::AlreadySigned)
        ));
        // Chunks are already in place
        assert!(tx.prepare_chunks().is_ok());
    }

    #[test]
    fn test_signature_data_omits_empty_fields() {
        let mut tx = Transaction::from_data(&b"abc"[..]);
        tx.prepare_chunks().unwrap();

        // No owner, target, reward, anchor or tags
        let expected = deep_hash_list(&[
            DeepHashItem::Blob(b"2"),
            DeepHashItem::Blob(b"0"),
            DeepHashItem::Blob(b"3"),
            DeepHashItem::Blob(tx.data_root()),
        ])
        .unwrap();
        assert_eq!(tx.signature_data().unwrap(), expected);
    }

    #[test]
    fn test_signature_data_v1_uses_inline_data() {
        let mut tx = Transaction::builder()
            .format(Format::V1)
            .data(&b"inline"[..])
            .tag("Content-Type", "text/plain")
            .build();
        tx.prepare_chunks().unwrap();
        assert!(tx.chunks().is_none());
        assert!(tx.data_root().is_empty());

        let expected = deep_hash_list(&[
            DeepHashItem::Blob(b"1"),
            DeepHashItem::Blob(b"0"),
            DeepHashItem::Blob(b"Content-Typetext/plain"),
            DeepHashItem::Blob(b"inline"),
        ])
        .unwrap();
        assert_eq!(tx.signature_data().unwrap(), expected);
    }

    #[test]
    fn test_tags_are_flattened_in_order() {
        let a = Transaction::builder().tag("a", "b").tag("c", "d").build();
        let b = Transaction::builder().tag("c", "d").tag("a", "b").build();
        let c = Transaction::builder().tag("ab", "cd").build();

        assert_ne!(a.signature_data().unwrap(), b.signature_data().unwrap());
        // Flattening has no delimiter
        assert_eq!(a.signature_data().unwrap(), c.signature_data().unwrap());
    }

    #[test]
    fn test_signature_data_requires_chunks() {
        let tx = Transaction::from_data(&b"not yet chunked"[..]);
        assert!(matches!(
            tx.signature_data(),
            Err(CoreError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_transfer_hashes_target_bytes() {
        let target = Address::from_owner(b"recipient");
        let tx = Transaction::transfer(Amount::from_winston(42), target.clone());
        assert_eq!(tx.data_size(), 0);
        assert_eq!(
            tx.price_request(),
            PriceRequest {
                bytes: 0,
                target: Some(target.clone()),
            }
        );

        let expected = deep_hash_list(&[
            DeepHashItem::Blob(b"2"),
            DeepHashItem::Blob(&target.to_bytes()),
            DeepHashItem::Blob(b"42"),
            DeepHashItem::Blob(b"0"),
        ])
        .unwrap();
        assert_eq!(tx.signature_data().unwrap(), expected);
    }

    #[test]
    fn test_empty_payload_has_no_chunks() {
        let mut tx = Transaction::from_data(Bytes::new());
        tx.prepare_chunks().unwrap();
        assert!(tx.chunks().unwrap().is_empty());
        assert!(tx.data_root().is_empty());
        assert!(tx.signature_data().is_ok());
    }

    #[test]
    fn test_prepare_chunks_is_idempotent() {
        let mut tx = Transaction::from_data(vec![7u8; MAX_CHUNK_SIZE + MIN_CHUNK_SIZE]);
        tx.prepare_chunks().unwrap();
        let first = tx.chunks().cloned();
        tx.prepare_chunks().unwrap();
        assert_eq!(tx.chunks().cloned(), first);
    }

    #[test]
    fn test_into_draft_keeps_chunks() {
        let mut tx = priced(Transaction::from_data(vec![1u8; 1000]));
        tx.add_tag("App", "test").unwrap();
        tx.sign(&wallet()).unwrap();
        let chunks = tx.chunks().cloned();
        let root = tx.data_root().to_vec();

        let draft = tx.into_draft();
        assert!(!draft.is_signed());
        assert!(draft.id().is_none());
        assert!(draft.last_tx().is_empty());
        assert!(draft.reward().is_none());
        assert_eq!(draft.chunks().cloned(), chunks);
        assert_eq!(draft.data_root(), root.as_slice());
        assert_eq!(draft.tags().len(), 1);
    }

    #[test]
    fn test_chunk_upload_bodies_replay() {
        let data: Vec<u8> = (0..(2 * MAX_CHUNK_SIZE + 100)).map(|i| i as u8).collect();
        let mut tx = Transaction::from_data(data.clone());
        tx.prepare_chunks().unwrap();
        assert!(!tx.data_in_body());

        let count = tx.chunks().unwrap().len();
        for index in 0..count {
            let upload = tx.chunk_upload(index).unwrap();
            let path = b64url_decode(&upload.data_path).unwrap();
            let chunk = b64url_decode(&upload.chunk).unwrap();
            let offset: usize = upload.offset.parse().unwrap();

            let validated = validate_path(tx.data_root(), offset, 0, data.len(), &path).unwrap();
            assert_eq!(validated.data_hash, Sha256Hash::hash(&chunk));
            assert_eq!(upload.data_size, data.len().to_string());
        }

        assert!(matches!(
            tx.chunk_upload(count),
            Err(CoreError::ChunkOutOfRange { index, count: c }) if index == count && c == count
        ));
    }

    #[test]
    fn test_prepare_chunks_rejects_foreign_root() {
        let mut tx = Transaction::from_data(&b"payload"[..]);
        tx.data_root = vec![9u8; 32];
        assert!(tx.prepare_chunks().is_err());
    }

    #[test]
    fn test_format_serde_as_integer() {
        assert_eq!(serde_json::to_string(&Format::V2).unwrap(), "2");
        assert_eq!(serde_json::from_str::<Format>("1").unwrap(), Format::V1);
        assert!(serde_json::from_str::<Format>("3").is_err());
    }
}
