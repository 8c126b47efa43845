//! SQLite memory store (feature-gated).
//!
//! The schema is shared with other processes that read the same file:
//!
//! ```sql
//! CREATE TABLE memory_store (key TEXT PRIMARY KEY, value TEXT, timestamp TEXT, ttl INTEGER)
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    Row,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
};
use swarm_debug_core::{
    MemoryRecord,
    clock,
    traits::{MemoryStore, StoreError},
};
use tokio::sync::OnceCell;

const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS memory_store (
        key TEXT PRIMARY KEY,
        value TEXT,
        timestamp TEXT,
        ttl INTEGER
    )
";

/// SQLite storage implementation.
///
/// The connection pool is opened lazily. Reads against a file that does not
/// exist yet return nothing without creating it; the first write creates the
/// parent directory, the file and the table.
pub struct SqliteMemoryStore {
    path: PathBuf,
    pool: OnceCell<SqlitePool>,
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl SqliteMemoryStore {
    /// Create a store backed by `path` without touching the filesystem.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: OnceCell::new(),
        }
    }

    /// Create a store and open the database immediately.
    ///
    /// # Errors
    /// Returns error if the directory or database cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(path);
        store.pool().await?;
        Ok(store)
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the pool, if it was opened.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }

    async fn pool(&self) -> Result<&SqlitePool, StoreError> {
        self.pool.get_or_try_init(|| connect(&self.path)).await
    }

    /// Pool for reads: `None` when the file was never created.
    async fn existing_pool(&self) -> Result<Option<&SqlitePool>, StoreError> {
        if let Some(pool) = self.pool.get() {
            return Ok(Some(pool));
        }
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        self.pool().await.map(Some)
    }
}

async fn connect(path: &Path) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(db_err)?;

    sqlx::query(SCHEMA).execute(&pool).await.map_err(db_err)?;

    tracing::debug!(path = %path.display(), "Memory store opened");
    Ok(pool)
}

fn record_from_row(row: &SqliteRow) -> Result<MemoryRecord, sqlx::Error> {
    let key: String = row.try_get("key")?;
    let ttl = ttl_from_column(&key, row.try_get("ttl")?);
    Ok(MemoryRecord {
        key,
        value: row
            .try_get::<Option<String>, _>("value")?
            .unwrap_or_else(|| "null".to_string()),
        timestamp: row
            .try_get::<Option<String>, _>("timestamp")?
            .unwrap_or_default(),
        ttl,
    })
}

/// TTL column as written by any process sharing the file. Values outside
/// `0..=u32::MAX` cannot be honoured and are read as "no TTL".
fn ttl_from_column(key: &str, raw: Option<i64>) -> Option<u32> {
    let raw = raw?;
    match u32::try_from(raw) {
        Ok(ttl) => Some(ttl),
        Err(_) => {
            tracing::warn!(key, ttl = raw, "Ignoring out-of-range TTL, record never expires");
            None
        }
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn put_with_ttl(
        &self,
        key: &str,
        value: &Value,
        ttl: Option<u32>,
    ) -> Result<(), StoreError> {
        let record = MemoryRecord::new(key, value, ttl);
        let pool = self.pool().await?;

        sqlx::query(
            "INSERT OR REPLACE INTO memory_store (key, value, timestamp, ttl) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.key)
        .bind(&record.value)
        .bind(&record.timestamp)
        .bind(record.ttl.map(i64::from))
        .execute(pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_record(&self, key: &str) -> Result<Option<MemoryRecord>, StoreError> {
        let Some(pool) = self.existing_pool().await? else {
            return Ok(None);
        };

        let row = sqlx::query("SELECT key, value, timestamp, ttl FROM memory_store WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await
            .map_err(db_err)?;

        let record = row.as_ref().map(record_from_row).transpose().map_err(db_err)?;
        let now = clock::now();
        Ok(record.filter(|record| !record.is_expired_at(now)))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let Some(pool) = self.existing_pool().await? else {
            return Ok(Vec::new());
        };

        let prefix_len = i64::try_from(prefix.chars().count())
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let rows = sqlx::query(
            "SELECT key, '' AS value, timestamp, ttl FROM memory_store \
             WHERE substr(key, 1, ?) = ? ORDER BY key",
        )
        .bind(prefix_len)
        .bind(prefix)
        .fetch_all(pool)
        .await
        .map_err(db_err)?;

        let now = clock::now();
        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = record_from_row(row).map_err(db_err)?;
            if !record.is_expired_at(now) {
                keys.push(record.key);
            }
        }
        Ok(keys)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let Some(pool) = self.existing_pool().await? else {
            return Ok(0);
        };

        let rows = sqlx::query(
            "SELECT key, '' AS value, timestamp, ttl FROM memory_store WHERE ttl IS NOT NULL",
        )
        .fetch_all(pool)
        .await
        .map_err(db_err)?;

        let now = clock::now();
        let mut tx = pool.begin().await.map_err(db_err)?;
        let mut removed = 0;
        for row in &rows {
            let record = record_from_row(row).map_err(db_err)?;
            if record.is_expired_at(now) {
                removed += sqlx::query("DELETE FROM memory_store WHERE key = ?")
                    .bind(&record.key)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?
                    .rows_affected();
            }
        }
        tx.commit().await.map_err(db_err)?;

        if removed > 0 {
            tracing::info!(removed, "Purged expired memory records");
        }
        Ok(removed)
    }

    fn backing_exists(&self) -> bool {
        self.path.exists()
    }
}
