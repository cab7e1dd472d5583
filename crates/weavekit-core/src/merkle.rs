//! Payload chunking and Merkle proofs over chunk digests.
//!
//! A payload is split into chunks of at most [`MAX_CHUNK_SIZE`] bytes. Each
//! chunk becomes a leaf committing to its SHA-256 digest and its end offset;
//! each branch commits to both children and the byte boundary between them.
//! The root of that tree is the transaction's `data_root`.
//!
//! Proofs are serialized root-to-leaf:
//!
//! ```text
//! branch: left_id (32) || right_id (32) || note(boundary) (32)
//! leaf:   data_hash (32) || note(end) (32)
//! ```
//!
//! where `note(n)` is `n` as a 32-byte big-endian integer.
//!
//! **Note**: Thresholds and node construction are network consensus values.

use crate::crypto::Sha256Hash;

/// Largest chunk the network accepts.
pub const MAX_CHUNK_SIZE: usize = 256 * 1024;

/// Smallest trailing chunk the splitter will produce.
pub const MIN_CHUNK_SIZE: usize = 32 * 1024;

/// Size of a node id or chunk digest inside a proof.
pub const HASH_SIZE: usize = 32;

/// Size of an offset note inside a proof.
pub const NOTE_SIZE: usize = 32;

/// One chunk of a payload: `[min_byte_range, max_byte_range)` and its digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub data_hash: Sha256Hash,
    pub min_byte_range: usize,
    pub max_byte_range: usize,
}

impl Chunk {
    /// Length of the chunk in bytes.
    pub fn len(&self) -> usize {
        self.max_byte_range - self.min_byte_range
    }

    /// Whether the chunk covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte range of the chunk within the payload.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.min_byte_range..self.max_byte_range
    }
}

/// Inclusion proof for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    /// Last byte offset covered by the chunk (`max_byte_range - 1`).
    pub offset: usize,
    /// Serialized Merkle path from the root down to the chunk's leaf.
    pub proof: Vec<u8>,
}

/// The chunk bundle of a payload.
///
/// Held locally to serve chunk uploads after commit; never part of the
/// submitted transaction body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunks {
    /// Merkle root, `None` for an empty payload.
    pub data_root: Option<Sha256Hash>,
    pub chunks: Vec<Chunk>,
    pub proofs: Vec<Proof>,
}

impl Chunks {
    /// The bundle of a zero-length payload.
    pub fn empty() -> Self {
        Self {
            data_root: None,
            chunks: Vec::new(),
            proofs: Vec::new(),
        }
    }

    /// Root bytes as hashed into the transaction (empty when there is no root).
    pub fn data_root_bytes(&self) -> &[u8] {
        match &self.data_root {
            Some(root) => root.as_ref(),
            None => &[],
        }
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the bundle has no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Result of replaying a proof against a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPath {
    /// Last byte offset of the proven chunk.
    pub offset: usize,
    pub left_bound: usize,
    pub right_bound: usize,
    pub chunk_size: usize,
    /// Digest of the proven chunk's bytes.
    pub data_hash: Sha256Hash,
}

#[derive(Debug)]
enum Node {
    Leaf {
        id: Sha256Hash,
        data_hash: Sha256Hash,
        max_byte_range: usize,
    },
    Branch {
        id: Sha256Hash,
        byte_range: usize,
        max_byte_range: usize,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn id(&self) -> &Sha256Hash {
        match self {
            Node::Leaf { id, .. } | Node::Branch { id, .. } => id,
        }
    }

    fn max_byte_range(&self) -> usize {
        match self {
            Node::Leaf { max_byte_range, .. } | Node::Branch { max_byte_range, .. } => {
                *max_byte_range
            }
        }
    }
}

/// Build the complete chunk bundle of a payload.
pub fn generate_transaction_chunks(data: &[u8]) -> Chunks {
    if data.is_empty() {
        return Chunks::empty();
    }

    let mut chunks = chunk_data(data);
    let leaves = chunks.iter().map(leaf).collect();
    let root = match build_layers(leaves) {
        Some(root) => root,
        None => return Chunks::empty(),
    };

    let mut proofs = Vec::with_capacity(chunks.len());
    resolve_proofs(&root, &mut Vec::new(), &mut proofs);

    // An exact multiple of MAX_CHUNK_SIZE leaves a zero-length tail. It stays
    // in the tree, which is how the network computes the root, but it is
    // not a chunk anyone uploads.
    if chunks.last().map_or(false, Chunk::is_empty) {
        chunks.pop();
        proofs.pop();
    }

    Chunks {
        data_root: Some(*root.id()),
        chunks,
        proofs,
    }
}

/// Split a payload into chunk ranges and digests.
///
/// When a full chunk would leave a remainder under [`MIN_CHUNK_SIZE`], the
/// rest is split into two halves instead so both stay above the minimum.
fn chunk_data(data: &[u8]) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(data.len() / MAX_CHUNK_SIZE + 1);
    let mut cursor = 0;

    while data.len() - cursor >= MAX_CHUNK_SIZE {
        let rest = data.len() - cursor;
        let mut chunk_size = MAX_CHUNK_SIZE;
        let next_chunk_size = rest - MAX_CHUNK_SIZE;
        if next_chunk_size > 0 && next_chunk_size < MIN_CHUNK_SIZE {
            chunk_size = (rest + 1) / 2;
        }

        let end = cursor + chunk_size;
        chunks.push(Chunk {
            data_hash: Sha256Hash::hash(&data[cursor..end]),
            min_byte_range: cursor,
            max_byte_range: end,
        });
        cursor = end;
    }

    chunks.push(Chunk {
        data_hash: Sha256Hash::hash(&data[cursor..]),
        min_byte_range: cursor,
        max_byte_range: data.len(),
    });
    chunks
}

fn leaf(chunk: &Chunk) -> Node {
    let note = int_to_note(chunk.max_byte_range);
    Node::Leaf {
        id: hash_leaf(&chunk.data_hash, &note),
        data_hash: chunk.data_hash,
        max_byte_range: chunk.max_byte_range,
    }
}

fn hash_leaf(data_hash: &Sha256Hash, note: &[u8]) -> Sha256Hash {
    Sha256Hash::hash_all(&[
        Sha256Hash::hash(data_hash.as_ref()).as_ref(),
        Sha256Hash::hash(note).as_ref(),
    ])
}

fn hash_branch_id(left_id: &[u8], right_id: &[u8], note: &[u8]) -> Sha256Hash {
    Sha256Hash::hash_all(&[
        Sha256Hash::hash(left_id).as_ref(),
        Sha256Hash::hash(right_id).as_ref(),
        Sha256Hash::hash(note).as_ref(),
    ])
}

fn branch(left: Node, right: Node) -> Node {
    let byte_range = left.max_byte_range();
    let note = int_to_note(byte_range);
    Node::Branch {
        id: hash_branch_id(left.id().as_ref(), right.id().as_ref(), &note),
        byte_range,
        max_byte_range: right.max_byte_range(),
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Pair nodes layer by layer until one remains. An unpaired node is promoted.
fn build_layers(mut nodes: Vec<Node>) -> Option<Node> {
    while nodes.len() > 1 {
        let mut next = Vec::with_capacity((nodes.len() + 1) / 2);
        let mut iter = nodes.into_iter();
        while let Some(left) = iter.next() {
            match iter.next() {
                Some(right) => next.push(branch(left, right)),
                None => next.push(left),
            }
        }
        nodes = next;
    }
    nodes.pop()
}

fn resolve_proofs(node: &Node, path: &mut Vec<u8>, out: &mut Vec<Proof>) {
    match node {
        Node::Leaf {
            data_hash,
            max_byte_range,
            ..
        } => {
            let mut proof = Vec::with_capacity(path.len() + HASH_SIZE + NOTE_SIZE);
            proof.extend_from_slice(path);
            proof.extend_from_slice(data_hash.as_ref());
            proof.extend_from_slice(&int_to_note(*max_byte_range));
            out.push(Proof {
                offset: max_byte_range.saturating_sub(1),
                proof,
            });
        }
        Node::Branch {
            byte_range,
            left,
            right,
            ..
        } => {
            let depth = path.len();
            path.extend_from_slice(left.id().as_ref());
            path.extend_from_slice(right.id().as_ref());
            path.extend_from_slice(&int_to_note(*byte_range));
            resolve_proofs(left, path, out);
            resolve_proofs(right, path, out);
            path.truncate(depth);
        }
    }
}

/// Replay a serialized proof against a root id.
///
/// `dest` is any byte offset inside the chunk being proven; `left_bound` and
/// `right_bound` bracket the payload (`0` and `data_size` at the top level).
/// Returns `None` if any node hash along the path disagrees with its parent,
/// or if the bounds collapse while descending.
pub fn validate_path(
    id: &[u8],
    dest: usize,
    left_bound: usize,
    right_bound: usize,
    path: &[u8],
) -> Option<ValidatedPath> {
    if right_bound == 0 || left_bound > right_bound {
        return None;
    }
    if dest >= right_bound {
        return validate_path(id, 0, right_bound - 1, right_bound, path);
    }

    if path.len() == HASH_SIZE + NOTE_SIZE {
        let (data_hash, note) = path.split_at(HASH_SIZE);
        let data_hash = Sha256Hash::try_from(data_hash).ok()?;
        if hash_leaf(&data_hash, note).as_ref() != id {
            return None;
        }
        return Some(ValidatedPath {
            offset: right_bound - 1,
            left_bound,
            right_bound,
            chunk_size: right_bound.checked_sub(left_bound)?,
            data_hash,
        });
    }

    if path.len() < 2 * HASH_SIZE + NOTE_SIZE {
        return None;
    }
    let (left, rest) = path.split_at(HASH_SIZE);
    let (right, rest) = rest.split_at(HASH_SIZE);
    let (note, remainder) = rest.split_at(NOTE_SIZE);
    let offset = note_to_int(note)?;

    if hash_branch_id(left, right, note).as_ref() != id {
        return None;
    }

    if dest < offset {
        validate_path(left, dest, left_bound, right_bound.min(offset), remainder)
    } else {
        validate_path(right, dest, left_bound.max(offset), right_bound, remainder)
    }
}

fn int_to_note(n: usize) -> [u8; NOTE_SIZE] {
    let mut note = [0u8; NOTE_SIZE];
    note[NOTE_SIZE - 8..].copy_from_slice(&(n as u64).to_be_bytes());
    note
}

fn note_to_int(note: &[u8]) -> Option<usize> {
    let (high, low) = note.split_at(NOTE_SIZE - 8);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let low: [u8; 8] = low.try_into().ok()?;
    usize::try_from(u64::from_be_bytes(low)).ok()
}
