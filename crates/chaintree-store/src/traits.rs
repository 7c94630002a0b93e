//! BlockStore trait: the abstract interface for content-addressed blocks.
//!
//! This trait is the sole I/O boundary of the DAG resolver. Implementations
//! include SQLite and in-memory.

use async_trait::async_trait;
use bytes::Bytes;
use chaintree_core::{decode_node, encode_node, ContentId, Node};

use crate::error::{Result, StoreError};

/// A serialized node together with its content id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    id: ContentId,
    data: Bytes,
}

impl Block {
    /// Wrap raw bytes, computing their content id.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            id: ContentId::for_bytes(&data),
            data,
        }
    }

    /// Wrap bytes that claim a particular id.
    ///
    /// Fails if the id is not the hash of the bytes.
    pub fn with_id(id: ContentId, data: impl Into<Bytes>) -> Result<Self> {
        let block = Self::new(data);
        if block.id != id {
            return Err(StoreError::IdMismatch {
                declared: id,
                computed: block.id,
            });
        }
        Ok(block)
    }

    /// Encode a node into a block.
    pub fn from_node(node: &Node) -> Result<Self> {
        Ok(Self::new(encode_node(node)?))
    }

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }
}

/// Result of putting a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Block was stored.
    Inserted,
    /// Block already exists (idempotent - not an error).
    AlreadyExists,
}

/// The BlockStore trait: async interface for block persistence.
///
/// # Design Notes
///
/// - **Write-once**: a block's bytes never change once stored. Putting the
///   same block twice returns `AlreadyExists`.
/// - **Missing blocks**: `get` fails with [`StoreError::NotFound`].
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Store a block.
    async fn put(&self, block: &Block) -> Result<InsertResult>;

    /// Fetch a block's bytes by id.
    async fn get(&self, id: &ContentId) -> Result<Bytes>;

    /// Remove a block. Removing an absent block is not an error.
    async fn delete(&self, id: &ContentId) -> Result<()>;

    /// Check if a block exists.
    async fn has(&self, id: &ContentId) -> Result<bool>;
}

#[async_trait]
impl<S: BlockStore + ?Sized> BlockStore for std::sync::Arc<S> {
    async fn put(&self, block: &Block) -> Result<InsertResult> {
        (**self).put(block).await
    }

    async fn get(&self, id: &ContentId) -> Result<Bytes> {
        (**self).get(id).await
    }

    async fn delete(&self, id: &ContentId) -> Result<()> {
        (**self).delete(id).await
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        (**self).has(id).await
    }
}

/// Extension trait for working with decoded nodes.
pub trait StoreExt: BlockStore {
    /// Encode and store a node, returning its id.
    fn put_node(&self, node: &Node) -> impl std::future::Future<Output = Result<ContentId>> + Send;

    /// Fetch and decode a node.
    fn get_node(&self, id: &ContentId) -> impl std::future::Future<Output = Result<Node>> + Send;
}

impl<S: BlockStore + ?Sized> StoreExt for S {
    async fn put_node(&self, node: &Node) -> Result<ContentId> {
        let block = Block::from_node(node)?;
        self.put(&block).await?;
        Ok(*block.id())
    }

    async fn get_node(&self, id: &ContentId) -> Result<Node> {
        let data = self.get(id).await?;
        Ok(decode_node(&data)?)
    }
}
