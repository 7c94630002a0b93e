//! Error types for ChainTree operations.

use chaintree_core::{CoreError, Did};
use chaintree_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ChainTree operations.
///
/// A path segment that does not exist is not an error: resolution reports it
/// through [`crate::Resolved::remainder_path`].
#[derive(Debug, Error)]
pub enum ChainTreeError {
    /// Storage error, propagated unchanged.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Encoding, decoding or identity format error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The tree has no usable `id` field.
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),

    /// The chain of tips holds something other than links.
    #[error("malformed chain: {0}")]
    MalformedChain(String),

    /// A transaction was attempted through a handle without a private key.
    #[error("can only play transactions on a tree with a private key attached")]
    MissingSigningKey,

    /// No current tip is known for a referenced tree.
    #[error("unknown tree: {0}")]
    UnknownTree(Did),

    /// An authentication entry could not be interpreted.
    #[error("invalid authentication entry: {0}")]
    InvalidAuthentication(String),

    /// An ownership reference leads back to a tree already being resolved.
    #[error("ownership cycle: {0}")]
    OwnershipCycle(String),

    /// Ownership indirection nested deeper than the configured limit.
    #[error("ownership indirection deeper than {limit} trees")]
    OwnershipDepthExceeded { limit: usize },

    /// The signing engine rejected or failed a request.
    #[error("engine error: {0}")]
    Engine(String),
}

/// Result type for ChainTree operations.
pub type Result<T> = std::result::Result<T, ChainTreeError>;
