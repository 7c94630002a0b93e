//! Error types for the ChainTree core.

use thiserror::Error;

/// Core errors raised by pure encoding and identity operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid content id: {0}")]
    InvalidContentId(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid DID: {0}")]
    InvalidDid(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
