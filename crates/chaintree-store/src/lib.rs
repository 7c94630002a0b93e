//! # ChainTree Store
//!
//! Content-addressed block storage for ChainTrees. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`BlockStore`] - The async trait every backend implements
//! - [`StoreExt`] - Node-level helpers (`put_node`, `get_node`)
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`Block`] - Serialized node bytes plus their content id
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chaintree_core::{node, Value};
//! use chaintree_store::{SqliteStore, StoreExt};
//!
//! async fn example() {
//!     let store = SqliteStore::open("blocks.db").unwrap();
//!     let id = store
//!         .put_node(&node([("someData", Value::from("I am 1"))]))
//!         .await
//!         .unwrap();
//!     let back = store.get_node(&id).await.unwrap();
//!     assert_eq!(back.get("someData"), Some(&Value::from("I am 1")));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent puts**: storing the same block twice returns `AlreadyExists`
//! - **No retries**: failures surface to the caller unchanged

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Block, BlockStore, InsertResult, StoreExt};
