//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{cosine_similarity, Fragment, SearchResult, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    fragments: RwLock<HashMap<String, Fragment>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            fragments: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, fragment: &Fragment) -> Result<()> {
        let mut fragments = self.fragments.write().unwrap();
        fragments.insert(fragment.id.to_string(), fragment.clone());
        Ok(())
    }

    async fn upsert_batch(&self, batch: &[Fragment]) -> Result<usize> {
        let mut fragments = self.fragments.write().unwrap();
        for fragment in batch {
            fragments.insert(fragment.id.to_string(), fragment.clone());
        }
        Ok(batch.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let fragments = self.fragments.read().unwrap();

        let mut results: Vec<SearchResult> = fragments
            .values()
            .map(|fragment| {
                let score = cosine_similarity(query_embedding, &fragment.embedding);
                SearchResult {
                    fragment: fragment.clone(),
                    score,
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn fragment_count(&self) -> Result<usize> {
        let fragments = self.fragments.read().unwrap();
        Ok(fragments.len())
    }
}
