//! # ChainTree
//!
//! Content-addressed DAG resolution, tree identities and ownership graphs.
//!
//! ## Overview
//!
//! A ChainTree is a rooted DAG of immutable nodes in a content store. Its
//! root names the tree (`did:tupelo:0x..`), holds application data under
//! `tree/data`, lists its owners under `tree/_tupelo/authentications`, and
//! links back to the previous root under `chain/end/previousTip`.
//!
//! - **Resolution**: walk a slash path through nested maps, lists and links
//! - **Identity**: DIDs derived from the genesis public key
//! - **Ownership**: authentications that may delegate to other trees
//! - **Commits**: transactions are validated and signed by an external
//!   [`SigningEngine`]; the handle only ever moves to a tip the engine proved
//!
//! ## Key Concepts
//!
//! - **Remainder path**: a path that runs out of data is not an error; the
//!   unconsumed segments come back in [`Resolved::remainder_path`]
//! - **Tip**: the content id of the current root; every commit makes a new one
//! - **Effective owners**: the addresses left once every DID reference in the
//!   authentications has been expanded
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chaintree::core::{node, Value};
//! use chaintree::store::{MemoryStore, StoreExt};
//! use chaintree::Dag;
//!
//! async fn example() {
//!     let store = Arc::new(MemoryStore::new());
//!     let leaf = store
//!         .put_node(&node([("someData", Value::from("I am 1"))]))
//!         .await
//!         .unwrap();
//!     let root = store
//!         .put_node(&node([("one", Value::Link(leaf))]))
//!         .await
//!         .unwrap();
//!
//!     let dag = Dag::new(root, store);
//!     let resolved = dag.resolve("/one/someData").await.unwrap();
//!     assert_eq!(resolved.value(), Some(&Value::from("I am 1")));
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `chaintree::core` - Values, canonical encoding, keys and DIDs
//! - `chaintree::store` - Block storage backends

pub mod chaintree;
pub mod config;
pub mod dag;
pub mod engine;
pub mod error;
pub mod history;
pub mod ownership;
pub mod path;
pub mod transactions;

// Re-export component crates
pub use chaintree_core as core;
pub use chaintree_store as store;

pub use crate::chaintree::{layout, ChainTree, TreeKey};
pub use config::ChainTreeConfig;
pub use dag::{resolve_path, Dag, Resolved};
pub use engine::{Proof, SigningEngine, TipSource};
pub use error::{ChainTreeError, Result};
pub use history::{ownership_history, tip_history, OwnershipChange};
pub use ownership::{AuthenticationEntry, OwnershipResolver};
pub use path::DagPath;
pub use transactions::{
    canonical_token_name, establish_token_transaction, mint_token_transaction,
    receive_token_transaction, send_token_transaction, set_data_transaction,
    set_ownership_transaction, Transaction, TransactionType,
};

pub use chaintree_core::{Address, ContentId, Did, Ed25519PublicKey, Keypair, Node, Value};
