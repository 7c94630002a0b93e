//! In-memory implementation of the BlockStore trait.
//!
//! Keeps everything in memory with no persistence. Same semantics as SQLite.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use chaintree_core::ContentId;

use crate::error::{Result, StoreError};
use crate::traits::{Block, BlockStore, InsertResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    blocks: RwLock<HashMap<ContentId, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ContentId, Bytes>>> {
        self.blocks
            .read()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<ContentId, Bytes>>> {
        self.blocks
            .write()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn put(&self, block: &Block) -> Result<InsertResult> {
        let mut blocks = self.write()?;
        if blocks.contains_key(block.id()) {
            return Ok(InsertResult::AlreadyExists);
        }
        blocks.insert(*block.id(), block.data().clone());
        Ok(InsertResult::Inserted)
    }

    async fn get(&self, id: &ContentId) -> Result<Bytes> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    async fn delete(&self, id: &ContentId) -> Result<()> {
        self.write()?.remove(id);
        Ok(())
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use chaintree_core::{node, Value};

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let block = Block::new(b"some block".to_vec());

        let result = store.put(&block).await.unwrap();
        assert_eq!(result, InsertResult::Inserted);

        let data = store.get(block.id()).await.unwrap();
        assert_eq!(&data[..], b"some block");
        assert!(store.has(block.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_idempotent() {
        let store = MemoryStore::new();
        let block = Block::new(b"twice".to_vec());

        assert_eq!(store.put(&block).await.unwrap(), InsertResult::Inserted);
        assert_eq!(store.put(&block).await.unwrap(), InsertResult::AlreadyExists);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_not_found_after_delete() {
        let store = MemoryStore::new();
        let id = store
            .put_node(&node([("someData", Value::from("I am 1"))]))
            .await
            .unwrap();

        store.delete(&id).await.unwrap();
        let err = store.get(&id).await.unwrap_err();
        assert!(err.is_not_found());

        // Deleting again is fine.
        store.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_node_roundtrip_through_store() {
        let store = MemoryStore::new();
        let n = node([("a", Value::from(1u64)), ("b", Value::from("two"))]);
        let id = store.put_node(&n).await.unwrap();
        assert_eq!(store.get_node(&id).await.unwrap(), n);
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_an_error() {
        let store = std::sync::Arc::new(MemoryStore::new());
        assert!(store.is_empty().unwrap());

        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.blocks.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(StoreError::InvalidData(_))));
        assert!(store.is_empty().is_err());
        let block = Block::new(b"after".to_vec());
        assert!(store.put(&block).await.is_err());
    }

    #[test]
    fn test_block_with_wrong_id_rejected() {
        let err = Block::with_id(ContentId::from_bytes([0; 32]), b"data".to_vec()).unwrap_err();
        assert!(matches!(err, StoreError::IdMismatch { .. }));
    }
}
