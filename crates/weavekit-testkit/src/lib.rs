//! # Weavekit Testkit
//!
//! Testing utilities for Weavekit.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Boundary vectors**: payload sizes around the chunking limits with the
//!   chunk layout each must produce
//! - **Generators**: Proptest strategies for payloads, tags and amounts
//! - **Fixtures**: Cached wallets and a stub gateway wired into a [`Weave`]
//!
//! ## Boundary Vectors
//!
//! ```rust
//! use weavekit_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, layout) in verify_all_vectors() {
//!     assert!(ok, "{}: {:?}", name, layout);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use weavekit_testkit::generators::payload;
//!
//! proptest! {
//!     #[test]
//!     fn root_is_deterministic(data in payload(4096)) {
//!         let a = weavekit_core::generate_transaction_chunks(&data);
//!         let b = weavekit_core::generate_transaction_chunks(&data);
//!         prop_assert_eq!(a.data_root, b.data_root);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use weavekit_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let weave = fixture.weave();
//! ```
//!
//! [`Weave`]: weavekit::Weave

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    jwk_file, jwk_json, multi_party_fixtures, shared_gateway_fixtures, wallet, TestFixture, ANCHOR,
    PRICE,
};
pub use generators::{payload, tag, tags};
pub use vectors::{all_vectors, pattern, verify_all_vectors, ChunkVector};
