//! SQLite implementation of the BlockStore trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chaintree_core::ContentId;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Block, BlockStore, InsertResult};

/// SQLite-based block store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Total bytes of block data stored.
    pub async fn total_size(&self) -> Result<u64> {
        self.blocking(|conn| {
            let size: i64 =
                conn.query_row("SELECT COALESCE(SUM(size), 0) FROM blocks", [], |row| {
                    row.get(0)
                })?;
            Ok(size as u64)
        })
        .await
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::InvalidData(format!("connection lock poisoned: {}", e)))?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl BlockStore for SqliteStore {
    async fn put(&self, block: &Block) -> Result<InsertResult> {
        let id = *block.id();
        let data = block.data().clone();

        self.blocking(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO blocks (content_id, data, size, stored_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id.as_bytes().as_slice(),
                    data.as_ref(),
                    data.len() as i64,
                    migration::now_millis()
                ],
            )?;
            if inserted == 0 {
                Ok(InsertResult::AlreadyExists)
            } else {
                tracing::trace!(block = %id, size = data.len(), "stored block");
                Ok(InsertResult::Inserted)
            }
        })
        .await
    }

    async fn get(&self, id: &ContentId) -> Result<Bytes> {
        let id = *id;
        self.blocking(move |conn| {
            let data: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT data FROM blocks WHERE content_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            data.map(Bytes::from).ok_or(StoreError::NotFound(id))
        })
        .await
    }

    async fn delete(&self, id: &ContentId) -> Result<()> {
        let id = *id;
        self.blocking(move |conn| {
            conn.execute(
                "DELETE FROM blocks WHERE content_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            Ok(())
        })
        .await
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        let id = *id;
        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM blocks WHERE content_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }
}
