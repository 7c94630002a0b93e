//! # ChainTree Testkit
//!
//! Testing utilities for ChainTrees.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **LocalEngine**: an in-process signing engine that validates ownership,
//!   applies transactions and signs proofs with a local notary key
//! - **Fixtures**: a memory store and engine wired together, plus
//!   deterministic keys
//! - **Generators**: Proptest strategies for keys, paths and node values
//!
//! ## Test Fixtures
//!
//! ```rust
//! use chaintree::set_data_transaction;
//! use chaintree_testkit::fixtures::{keypair, TestFixture};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let fixture = TestFixture::new();
//! let mut tree = fixture.new_tree(&keypair(1)).await.unwrap();
//! tree.play_transactions(&fixture.engine, &[set_data_transaction("/a/b", "x")])
//!     .await
//!     .unwrap();
//! # });
//! ```

pub mod engine;
pub mod fixtures;
pub mod generators;

pub use engine::LocalEngine;
pub use fixtures::{did, init_tracing, keypair, TestFixture};
