//! Test fixtures and helpers.
//!
//! RSA key generation is slow, so wallets are generated once per process
//! and handed out by index.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, OnceLock};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rsa::RsaPrivateKey;
use tempfile::NamedTempFile;
use weavekit::Weave;
use weavekit_client::MemoryGateway;
use weavekit_core::{Address, Amount, Wallet};

/// Anchor every fixture gateway serves.
pub const ANCHOR: &str = "R4e1qP8Vq3f2u6sYbXy0kqj5ZbS8B1hD0Pq3wNH1ZMtmHxjfEn3b1n6gIWUNDgyA";

/// Reward every fixture gateway quotes, in winston.
pub const PRICE: u128 = 65_595_508;

const KEY_BITS: usize = 2048;

/// The wallet at `index`. Same index, same key, for the life of the process.
pub fn wallet(index: u8) -> Wallet {
    static WALLETS: OnceLock<Mutex<HashMap<u8, Wallet>>> = OnceLock::new();
    let mut wallets = WALLETS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    wallets
        .entry(index)
        .or_insert_with(|| {
            let mut rng = StdRng::seed_from_u64(u64::from(index) + 1);
            let key = RsaPrivateKey::new(&mut rng, KEY_BITS).expect("rsa key generation");
            Wallet::from_key(key)
        })
        .clone()
}

/// A wallet serialized as a JWK document.
pub fn jwk_json(wallet: &Wallet) -> String {
    serde_json::to_string_pretty(&wallet.to_jwk()).expect("jwk serializes")
}

/// Write a wallet to a temporary JWK file.
pub fn jwk_file(wallet: &Wallet) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(jwk_json(wallet).as_bytes())
        .expect("write jwk");
    file
}

/// A wallet and a stub gateway answering with [`ANCHOR`] and [`PRICE`].
pub struct TestFixture {
    pub wallet: Wallet,
    pub gateway: MemoryGateway,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_wallet(0)
    }

    /// Use the wallet at `index`.
    pub fn with_wallet(index: u8) -> Self {
        Self {
            wallet: wallet(index),
            gateway: MemoryGateway::new(ANCHOR, Amount::from_winston(PRICE)),
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address().clone()
    }

    /// A Weave signing with the fixture wallet against the fixture gateway.
    ///
    /// The gateway is shared, so calls made through the Weave are visible on
    /// `self.gateway`.
    pub fn weave(&self) -> Weave<MemoryGateway> {
        Weave::new(self.wallet.clone(), self.gateway.clone())
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixtures with distinct wallets, each with its own gateway.
pub fn multi_party_fixtures(count: u8) -> Vec<TestFixture> {
    (0..count).map(TestFixture::with_wallet).collect()
}

/// Fixtures with distinct wallets sharing one gateway.
pub fn shared_gateway_fixtures(count: u8) -> Vec<TestFixture> {
    let gateway = MemoryGateway::new(ANCHOR, Amount::from_winston(PRICE));
    (0..count)
        .map(|index| TestFixture {
            wallet: wallet(index),
            gateway: gateway.clone(),
        })
        .collect()
}
