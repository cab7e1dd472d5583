//! Chunk layout vectors around the chunking limits.
//!
//! Each vector names a payload size and the exact chunk lengths the network
//! expects for it. Payload bytes come from [`pattern`], so a vector is fully
//! determined by its size.

use weavekit_core::{generate_transaction_chunks, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};

/// A chunk layout vector.
#[derive(Debug, Clone)]
pub struct ChunkVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Payload length in bytes.
    pub size: usize,
    /// Expected length of every uploaded chunk, in order.
    pub chunk_sizes: Vec<usize>,
}

const MAX: usize = MAX_CHUNK_SIZE;
const MIN: usize = MIN_CHUNK_SIZE;

/// Get all chunk layout vectors.
pub fn all_vectors() -> Vec<ChunkVector> {
    vec![
        ChunkVector {
            name: "empty payload",
            size: 0,
            chunk_sizes: vec![],
        },
        ChunkVector {
            name: "hello world",
            size: 11,
            chunk_sizes: vec![11],
        },
        ChunkVector {
            name: "one byte under a full chunk",
            size: MAX - 1,
            chunk_sizes: vec![MAX - 1],
        },
        ChunkVector {
            // The zero-length tail is part of the tree only
            name: "exactly one full chunk",
            size: MAX,
            chunk_sizes: vec![MAX],
        },
        ChunkVector {
            name: "one byte over a full chunk",
            size: MAX + 1,
            chunk_sizes: vec![131_073, 131_072],
        },
        ChunkVector {
            name: "remainder one byte under minimum",
            size: MAX + MIN - 1,
            chunk_sizes: vec![147_456, 147_455],
        },
        ChunkVector {
            name: "remainder exactly minimum",
            size: MAX + MIN,
            chunk_sizes: vec![MAX, MIN],
        },
        ChunkVector {
            name: "two full chunks",
            size: 2 * MAX,
            chunk_sizes: vec![MAX, MAX],
        },
        ChunkVector {
            name: "one byte over two full chunks",
            size: 2 * MAX + 1,
            chunk_sizes: vec![MAX, 131_073, 131_072],
        },
        ChunkVector {
            name: "small remainder after three full chunks",
            size: 3 * MAX + 10,
            chunk_sizes: vec![MAX, MAX, 131_077, 131_077],
        },
    ]
}

/// Deterministic payload of `size` bytes.
pub fn pattern(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Chunk lengths actually produced for a vector's payload.
pub fn chunk_layout(vector: &ChunkVector) -> Vec<usize> {
    generate_transaction_chunks(&pattern(vector.size))
        .chunks
        .iter()
        .map(|c| c.len())
        .collect()
}

/// Check every vector against the chunker.
///
/// Returns the name, whether the layout matched, and the layout produced.
pub fn verify_all_vectors() -> Vec<(String, bool, Vec<usize>)> {
    all_vectors()
        .iter()
        .map(|v| {
            let layout = chunk_layout(v);
            (v.name.to_string(), layout == v.chunk_sizes, layout)
        })
        .collect()
}
