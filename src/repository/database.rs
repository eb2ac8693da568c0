use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, QueryBuilder, Row, Sqlite, Transaction};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::model::{ArchiveKey, ArchiveRef};

use super::SCHEMA_VERSION;

/// Rows per multi-row INSERT statement, well under SQLite's bind limit
const INSERT_CHUNK: usize = 5000;

/// Suffixes of SQLite side files that only matter to a live connection
const STALE_SUFFIXES: [&str; 2] = [".db-journal", ".db-shm"];

/// Seen-set of processed archive paths, backed by SQLite
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Remove lock and journal artifacts a crashed instance may have left in
    /// `state_dir`. Must run before [`Database::open`].
    ///
    /// The `-wal` file is kept: it holds committed transactions that have not
    /// been checkpointed yet and SQLite replays it on open.
    pub fn recover(state_dir: &Path) -> Result<usize> {
        let mut removed = 0;
        let entries = fs::read_dir(state_dir)
            .with_context(|| format!("Failed to read state directory: {}", state_dir.display()))?;

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if STALE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                fs::remove_file(entry.path())
                    .with_context(|| format!("Failed to remove stale file: {}", name))?;
                tracing::debug!(file = %name, "Removed stale SQLite artifact");
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Open (or create) the store at `db_path`.
    ///
    /// `max_connections` bounds concurrent lookups; writes are serialized by
    /// SQLite itself.
    pub async fn open(db_path: &Path, max_connections: u32) -> Result<Self> {
        // Built from the path directly: a URL would misread `?`, `#` or `%`
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        Self::connect(options, max_connections).await
    }

    /// In-memory store, single connection (tests and benchmarks)
    pub async fn in_memory() -> Result<Self> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?, 1).await
    }

    async fn connect(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        // PRAGMAs applied to every connection
        let options = options
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .context("Failed to open seen-set database")?;

        Ok(Self { pool })
    }

    /// Initialize database schema, returns true if it was (re)created
    pub async fn init_schema(&self) -> Result<bool> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )"
        ).execute(&self.pool).await?;

        let stored_version = self.get_metadata("schema_version").await?;
        let fresh = stored_version.as_deref() != Some(SCHEMA_VERSION);

        // Older databases only ever had processed_files(filepath), so an
        // unknown version is upgraded in place rather than dropped.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS processed_files (
                filepath TEXT PRIMARY KEY CHECK (filepath <> '')
            )"
        ).execute(&self.pool).await?;

        if fresh {
            self.set_metadata("schema_version", SCHEMA_VERSION).await?;
        }

        Ok(fresh)
    }

    /// Get metadata value by key
    pub async fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    /// Set metadata value
    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Check whether an archive has already been evaluated
    pub async fn contains(&self, archive: &ArchiveRef) -> Result<bool> {
        let query = sqlx::query("SELECT 1 FROM processed_files WHERE filepath = ?");
        let query = match archive.as_key() {
            ArchiveKey::Text(text) => query.bind(text),
            ArchiveKey::Raw(bytes) => query.bind(bytes),
        };
        let row = query
            .fetch_optional(&self.pool)
            .await
            .context("Seen-set lookup failed")?;
        Ok(row.is_some())
    }

    /// Record a batch of archives in one transaction.
    ///
    /// Already-present paths are ignored. On error the transaction is rolled
    /// back, so none of the batch becomes visible.
    pub async fn insert_batch(&self, archives: &[ArchiveRef]) -> Result<()> {
        if archives.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.context("Failed to begin seen-set transaction")?;
        self.insert_batch_in_tx(&mut tx, archives)
            .await
            .context("Failed to record processed archives")?;
        tx.commit().await.context("Failed to commit seen-set batch")?;
        Ok(())
    }

    async fn insert_batch_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        archives: &[ArchiveRef],
    ) -> Result<()> {
        for chunk in archives.chunks(INSERT_CHUNK) {
            // ON CONFLICT only covers the key, so other constraint
            // violations still abort the statement (OR IGNORE would skip them)
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO processed_files (filepath) "
            );
            // Text and blob values never compare equal in SQLite, so raw
            // keys cannot collide with UTF-8 ones
            qb.push_values(chunk, |mut row, archive| match archive.as_key() {
                ArchiveKey::Text(text) => {
                    row.push_bind(text);
                }
                ArchiveKey::Raw(bytes) => {
                    row.push_bind(bytes);
                }
            });
            qb.push(" ON CONFLICT(filepath) DO NOTHING");
            qb.build().execute(&mut **tx).await?;
        }

        Ok(())
    }

    /// Number of recorded archives
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_files")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Load every recorded key as bytes (see [`ArchiveKey::as_bytes`])
    pub async fn load_seen(&self) -> Result<FxHashSet<Vec<u8>>> {
        let rows: Vec<Vec<u8>> = sqlx::query_scalar("SELECT CAST(filepath AS BLOB) FROM processed_files")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// Close the pool, waiting for in-flight queries
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
