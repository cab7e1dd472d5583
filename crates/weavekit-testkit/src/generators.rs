//! Proptest generators for property-based testing.

use proptest::prelude::*;

use weavekit_core::{Amount, Tag, TransactionId, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};

/// Generate payload bytes up to `max_len`.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a non-empty payload up to `max_len`.
pub fn non_empty_payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Generate a payload length within a few bytes of a chunking boundary.
///
/// Lengths land on both sides of one, two and three full chunks, and of a
/// full chunk followed by a minimum-sized one.
pub fn boundary_len() -> impl Strategy<Value = usize> {
    let anchors = prop_oneof![
        Just(MAX_CHUNK_SIZE),
        Just(2 * MAX_CHUNK_SIZE),
        Just(3 * MAX_CHUNK_SIZE),
        Just(MAX_CHUNK_SIZE + MIN_CHUNK_SIZE),
    ];
    (anchors, -2isize..=2).prop_map(|(at, jitter)| at.saturating_add_signed(jitter))
}

/// Generate a payload whose length sits near a chunking boundary.
///
/// Bytes follow [`pattern`](crate::vectors::pattern) so large payloads stay
/// cheap to generate.
pub fn boundary_payload() -> impl Strategy<Value = Vec<u8>> {
    boundary_len().prop_map(crate::vectors::pattern)
}

/// Generate a tag with short printable name and value.
pub fn tag() -> impl Strategy<Value = Tag> {
    ("[A-Za-z-]{1,16}", "[ -~]{0,32}").prop_map(|(name, value)| Tag::new(name, value))
}

/// Generate up to `max` tags.
pub fn tags(max: usize) -> impl Strategy<Value = Vec<Tag>> {
    prop::collection::vec(tag(), 0..=max)
}

/// Generate an amount in winston.
pub fn amount() -> impl Strategy<Value = Amount> {
    any::<u64>().prop_map(|w| Amount::from_winston(u128::from(w)))
}

/// Generate a random TransactionId.
pub fn transaction_id() -> impl Strategy<Value = TransactionId> {
    any::<[u8; 32]>().prop_map(TransactionId::from_bytes)
}
