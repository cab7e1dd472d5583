//! # Weavekit
//!
//! The unified API for building, signing, committing and verifying
//! blockweave transactions.
//!
//! ## Overview
//!
//! - **Transactions**: format 2 data and transfer transactions whose
//!   payload is committed through a chunk Merkle root
//! - **Identity**: RSA-PSS wallets loaded from JWK files
//! - **Assembly**: anchor, price, sign, commit and chunk upload against a
//!   gateway
//! - **Reading**: balances, statuses and verified transactions
//!
//! ## Usage
//!
//! ```rust,no_run
//! use weavekit::{GatewayConfig, Wallet, Weave};
//!
//! async fn example() -> weavekit::Result<()> {
//!     let wallet = Wallet::from_jwk_file("wallet.json")?;
//!     let weave = Weave::connect(wallet, GatewayConfig::default())?;
//!
//!     let posted = weave.upload(&b"hello world"[..]).await?;
//!     println!("{} accepted: {}", posted.id, String::from_utf8_lossy(&posted.response));
//!
//!     let status = weave.status(&posted.id).await?;
//!     println!("{:?}", status);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `weavekit::core` - Deep hash, Merkle chunking, wallets, transactions
//! - `weavekit::client` - Gateway traits, HTTP gateway, assembler

pub mod error;
pub mod weave;

pub use weavekit_client as client;
pub use weavekit_core as core;

pub use error::{Result, WeaveError};
pub use weave::{Posted, Weave};

pub use weavekit_client::{
    Assembler, Assembly, AssemblyState, ChainInfo, ChainReader, Gateway, GatewayConfig,
    HttpGateway, MemoryGateway, TxStatus,
};
pub use weavekit_core::{
    Address, Amount, Format, Jwk, Signer, Tag, Transaction, TransactionBuilder, TransactionId,
    Unit, Wallet,
};
