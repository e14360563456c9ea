//! In-memory [`VectorStore`] implementation.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety.
//! Nearest-neighbour search is brute-force cosine similarity over all
//! stored vectors.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{IndexEntry, ScoredEntry};

use super::{IndexError, VectorStore};

pub struct MemoryStore {
    entries: RwLock<HashMap<String, IndexEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts by descending score; ties break on id so results are stable.
pub(crate) fn rank(mut hits: Vec<ScoredEntry>, k: usize) -> Vec<ScoredEntry> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(k);
    hits
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, entry: IndexEntry) -> Result<(), IndexError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn nearest(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredEntry>, IndexError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let hits: Vec<ScoredEntry> = entries
            .values()
            .map(|e| ScoredEntry {
                id: e.id.clone(),
                text: e.text.clone(),
                score: cosine_similarity(vector, &e.vector),
            })
            .collect();
        Ok(rank(hits, k))
    }

    async fn get(&self, id: &str) -> Result<Option<String>, IndexError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(id).map(|e| e.text.clone()))
    }

    async fn len(&self) -> Result<usize, IndexError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entry(id: &str, text: &str, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            text: text.to_string(),
            vector,
        }
    }

    #[tokio::test]
    async fn nearest_orders_by_similarity() {
        let store = MemoryStore::new();
        store.upsert(entry("x", "x", vec![1.0, 0.0])).await.unwrap();
        store.upsert(entry("y", "y", vec![0.0, 1.0])).await.unwrap();
        store.upsert(entry("xy", "xy", vec![0.7, 0.7])).await.unwrap();

        let hits = store.nearest(&[1.0, 0.1], 3).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "xy", "y"]);
    }

    #[tokio::test]
    async fn concurrent_upserts_with_distinct_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .upsert(entry(&format!("doc-{}", i), "text", vec![i as f32, 1.0]))
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(store.len().await.unwrap(), 32);
    }
}
