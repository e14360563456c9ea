//! SQLite-backed [`VectorStore`] implementation.
//!
//! Entries live in one table keyed by `(collection, id)`; embeddings are
//! stored as little-endian `f32` BLOBs and scanned with brute-force cosine
//! similarity, which is adequate for the few thousand documents a batch
//! typically holds.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{IndexEntry, ScoredEntry};

use super::memory::rank;
use super::{IndexError, VectorStore};

pub struct SqliteStore {
    pool: SqlitePool,
    collection: String,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `path` and ensures the
    /// collection exists.
    pub async fn open(path: &Path, collection: &str) -> Result<Self, IndexError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    IndexError::Setup(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        sqlx::query("INSERT OR IGNORE INTO collections (name, created_at) VALUES (?, ?)")
            .bind(collection)
            .bind(chrono::Utc::now().timestamp())
            .execute(&pool)
            .await?;

        Ok(Self {
            pool,
            collection: collection.to_string(),
        })
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), IndexError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_entries (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            dims INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id),
            FOREIGN KEY (collection) REFERENCES collections(name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[async_trait]
impl VectorStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn upsert(&self, entry: IndexEntry) -> Result<(), IndexError> {
        sqlx::query(
            r#"
            INSERT INTO index_entries (collection, id, text, embedding, dims, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET
                text = excluded.text,
                embedding = excluded.embedding,
                dims = excluded.dims,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.collection)
        .bind(&entry.id)
        .bind(&entry.text)
        .bind(vec_to_blob(&entry.vector))
        .bind(entry.vector.len() as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>, IndexError> {
        let rows: Vec<(String, String, Vec<u8>)> = sqlx::query_as(
            "SELECT id, text, embedding FROM index_entries WHERE collection = ?",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let hits = rows
            .into_iter()
            .map(|(id, text, blob)| ScoredEntry {
                score: cosine_similarity(vector, &blob_to_vec(&blob)),
                id,
                text,
            })
            .collect();
        Ok(rank(hits, k))
    }

    async fn get(&self, id: &str) -> Result<Option<String>, IndexError> {
        let text: Option<String> =
            sqlx::query_scalar("SELECT text FROM index_entries WHERE collection = ? AND id = ?")
                .bind(&self.collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(text)
    }

    async fn len(&self) -> Result<usize, IndexError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM index_entries WHERE collection = ?")
                .bind(&self.collection)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as usize)
    }
}
