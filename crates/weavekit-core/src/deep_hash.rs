//! Deep hash: the canonical digest over nested lists of byte buffers.
//!
//! - A blob `b` hashes to `H(H("blob" || len(b)) || H(b))`
//! - A list `xs` starts from `acc = H("list" || len(xs))` and folds every
//!   element in order as `acc = H(acc || deep_hash(x))`
//!
//! `H` is SHA-384 and lengths are decimal ASCII. The tag prefixes keep a blob
//! and a list of the same bytes apart; the fold keeps element order and
//! nesting significant.
//!
//! **Note**: This construction is consensus-critical. Any change breaks every
//! signature produced so far.

use crate::crypto::Sha384Hash;
use crate::error::{CoreError, Result};

const BLOB_TAG: &[u8] = b"blob";
const LIST_TAG: &[u8] = b"list";

/// One input to the deep hash: a byte buffer or a nested list of inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepHashItem<'a> {
    Blob(&'a [u8]),
    List(Vec<DeepHashItem<'a>>),
}

impl<'a> DeepHashItem<'a> {
    /// Build a flat list of blobs.
    pub fn blobs<I, B>(buffers: I) -> Self
    where
        I: IntoIterator<Item = &'a B>,
        B: AsRef<[u8]> + ?Sized + 'a,
    {
        DeepHashItem::List(
            buffers
                .into_iter()
                .map(|b| DeepHashItem::Blob(b.as_ref()))
                .collect(),
        )
    }
}

impl<'a> From<&'a [u8]> for DeepHashItem<'a> {
    fn from(data: &'a [u8]) -> Self {
        DeepHashItem::Blob(data)
    }
}

/// Hash any deep hash input.
///
/// Fails if the input is, or contains, an empty list.
pub fn deep_hash(item: &DeepHashItem<'_>) -> Result<Sha384Hash> {
    match item {
        DeepHashItem::Blob(data) => Ok(deep_hash_blob(data)),
        DeepHashItem::List(items) => deep_hash_list(items),
    }
}

/// Hash a single buffer.
pub fn deep_hash_blob(data: &[u8]) -> Sha384Hash {
    let len = data.len().to_string();
    let tag = Sha384Hash::hash_all(&[BLOB_TAG, len.as_bytes()]);
    let body = Sha384Hash::hash(data);
    Sha384Hash::hash_all(&[tag.as_ref(), body.as_ref()])
}

/// Hash an ordered, non-empty list of inputs.
pub fn deep_hash_list(items: &[DeepHashItem<'_>]) -> Result<Sha384Hash> {
    if items.is_empty() {
        return Err(CoreError::EmptyDeepHashList);
    }

    let len = items.len().to_string();
    let mut acc = Sha384Hash::hash_all(&[LIST_TAG, len.as_bytes()]);
    for item in items {
        let element = deep_hash(item)?;
        acc = Sha384Hash::hash_all(&[acc.as_ref(), element.as_ref()]);
    }
    Ok(acc)
}
