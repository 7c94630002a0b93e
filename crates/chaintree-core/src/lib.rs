//! # ChainTree Core
//!
//! Pure primitives for ChainTrees: content ids, node values, canonical
//! encoding and identities.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`ContentId`] - Content-addressed identifier (Blake3 hash of node bytes)
//! - [`Value`] / [`Node`] - The closed value model nodes are decoded into
//! - [`Did`] / [`Address`] - Tree identifiers derived from genesis keys
//! - [`Keypair`] - Ed25519 signing identity
//!
//! ## Canonicalization
//!
//! All nodes are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod types;
pub mod value;

pub use canonical::{decode_node, decode_value, encode_node, encode_value, node_id};
pub use crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::{CoreError, Result};
pub use identity::{Address, Did, ADDRESS_LEN, DID_LEN, DID_PREFIX};
pub use types::ContentId;
pub use value::{node, Node, Value};
