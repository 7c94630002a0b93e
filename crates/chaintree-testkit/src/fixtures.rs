//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::{Arc, Once};

use chaintree::{ChainTree, Result};
use chaintree_core::{Did, Keypair};
use chaintree_store::MemoryStore;

use crate::engine::LocalEngine;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// A shared memory store plus a local engine.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub engine: LocalEngine,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            engine: LocalEngine::new(),
        }
    }

    /// Create with a deterministic notary key from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            engine: LocalEngine::with_notary(Keypair::from_seed(&seed)),
        }
    }

    /// A fresh genesis tree owned by `keypair`, with the key attached.
    pub async fn new_tree(&self, keypair: &Keypair) -> Result<ChainTree<MemoryStore>> {
        ChainTree::new_empty_tree(&self.engine, Arc::clone(&self.store), keypair.clone()).await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A deterministic keypair, distinct for each `n`.
pub fn keypair(n: u8) -> Keypair {
    let mut seed = [0u8; 32];
    seed[0] = n;
    seed[31] = 0xc7;
    Keypair::from_seed(&seed)
}

/// The DID of [`keypair`]`(n)`.
pub fn did(n: u8) -> Did {
    Did::from_public_key(&keypair(n).public_key())
}
