//! Similarity index shared by all per-file tasks.
//!
//! [`SimilarityIndex`] pairs an [`EmbeddingProvider`] with a [`VectorStore`]
//! backend and exposes the two operations the pipeline needs: upsert by id
//! and k-nearest-neighbour query returning plain texts.
//!
//! Backends synchronise internally, so a single index handle can be cloned
//! into every task without external locking:
//!
//! | Backend | Type | Durability |
//! |---------|------|------------|
//! | `memory` | [`memory::MemoryStore`] | process lifetime |
//! | `sqlite` | [`sqlite::SqliteStore`] | survives across runs |

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{EmbeddingConfig, IndexConfig};
use crate::embedding::{self, EmbeddingProvider};
use crate::models::{IndexEntry, ScoredEntry};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("index store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("index setup failed: {0}")]
    Setup(String),
}

/// Storage backend for index entries.
///
/// One store instance serves exactly one named collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name as used in configuration.
    fn backend(&self) -> &'static str;

    /// Inserts the entry, replacing any previous entry with the same id.
    async fn upsert(&self, entry: IndexEntry) -> Result<(), IndexError>;

    /// Returns up to `k` entries ordered by descending cosine similarity.
    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>, IndexError>;

    /// Looks up the text stored under `id`.
    async fn get(&self, id: &str) -> Result<Option<String>, IndexError>;

    /// Number of distinct ids in the collection.
    async fn len(&self) -> Result<usize, IndexError>;
}

/// Summary of an index, printed by `qagen init`.
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub collection: String,
    pub backend: &'static str,
    pub embedding_model: String,
    pub entries: usize,
}

#[derive(Clone)]
pub struct SimilarityIndex {
    collection: String,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SimilarityIndex {
    pub fn new(
        collection: impl Into<String>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            collection: collection.into(),
            store,
            embedder,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        embedding::embed_one(self.embedder.as_ref(), text)
            .await
            .map_err(|e| IndexError::Embedding(format!("{:#}", e)))
    }

    /// Embeds `text` and stores it under `id`, replacing any earlier text.
    pub async fn upsert(&self, id: &str, text: &str) -> Result<(), IndexError> {
        let vector = self.embed(text).await?;
        self.store
            .upsert(IndexEntry {
                id: id.to_string(),
                text: text.to_string(),
                vector,
            })
            .await
    }

    /// Returns up to `k` stored texts most similar to `text`, most similar first.
    ///
    /// An entry upserted for `text` itself is not excluded.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<String>, IndexError> {
        if k == 0 || self.store.len().await? == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embed(text).await?;
        let hits = self.store.nearest(&vector, k).await?;
        Ok(hits.into_iter().map(|h| h.text).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<String>, IndexError> {
        self.store.get(id).await
    }

    pub async fn len(&self) -> Result<usize, IndexError> {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len().await? == 0)
    }

    pub async fn stats(&self) -> Result<IndexStats, IndexError> {
        Ok(IndexStats {
            collection: self.collection.clone(),
            backend: self.store.backend(),
            embedding_model: self.embedder.model_name().to_string(),
            entries: self.len().await?,
        })
    }
}

/// Creates the configured collection if absent, or opens the existing one.
///
/// Called once per run, before any task starts.
pub async fn setup(
    index: &IndexConfig,
    embedding: &EmbeddingConfig,
) -> Result<SimilarityIndex, IndexError> {
    let embedder = embedding::create_provider(embedding)
        .map_err(|e| IndexError::Setup(format!("{:#}", e)))?;

    let store: Arc<dyn VectorStore> = match index.backend.as_str() {
        "memory" => Arc::new(memory::MemoryStore::new()),
        "sqlite" => Arc::new(sqlite::SqliteStore::open(&index.path, &index.collection).await?),
        other => {
            return Err(IndexError::Setup(format!(
                "unknown index backend: '{}'",
                other
            )))
        }
    };

    let similarity = SimilarityIndex::new(index.collection.clone(), store, embedder);
    let stats = similarity.stats().await?;
    info!(
        "Index ready: collection={} backend={} embedding={} entries={}",
        stats.collection, stats.backend, stats.embedding_model, stats.entries
    );
    Ok(similarity)
}
