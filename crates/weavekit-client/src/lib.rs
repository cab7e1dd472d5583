//! # Weavekit Client
//!
//! The network side of Weavekit: collaborator traits, an HTTP gateway, an
//! in-memory stub, and the assembler that walks a transaction from draft to
//! committed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use weavekit_client::{Assembler, Assembly, GatewayConfig, HttpGateway};
//! use weavekit_core::{Transaction, Wallet};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let wallet = Wallet::from_jwk_file("wallet.json")?;
//!     let gateway = HttpGateway::new(GatewayConfig::default())?;
//!     let assembler = Assembler::new(gateway);
//!
//!     let mut assembly = Assembly::new(Transaction::from_data(&b"hello world"[..]));
//!     assembler.post(&mut assembly, &wallet).await?;
//!     println!("committed {:?}", assembly.transaction().id());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Client                              Gateway
//!   |-------- GET /tx_anchor --------->|
//!   |<------- anchor ------------------|
//!   |-------- GET /price/{bytes} ----->|
//!   |<------- reward ------------------|
//!   |   (chunk, deep hash, sign)       |
//!   |-------- POST /tx --------------->|
//!   |-------- POST /chunk (per chunk)->|
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod types;

pub use assembler::{Assembler, Assembly, AssemblyState, FailureReason};
pub use config::GatewayConfig;
pub use error::{ClientError, GatewayError, Result};
pub use gateway::memory::{Call, MemoryGateway};
pub use gateway::{ChainReader, Gateway};
pub use http::HttpGateway;
pub use types::{ChainInfo, StatusData, TxStatus};
