//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For large datasets, consider the sqlite-vec extension or a dedicated
//! vector database.

use super::{cosine_similarity, Fragment, SearchResult, VectorStore};
use crate::error::{CineRagError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS fragments (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    year TEXT NOT NULL,
    genre TEXT NOT NULL,
    rating REAL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fragments_title ON fragments(title);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn insert_fragment(conn: &Connection, fragment: &Fragment) -> Result<()> {
        let embedding_bytes = Self::embedding_to_bytes(&fragment.embedding);

        conn.execute(
            r#"
            INSERT OR REPLACE INTO fragments
            (id, title, year, genre, rating, content, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                fragment.id.to_string(),
                fragment.title,
                fragment.year,
                fragment.genre,
                fragment.rating,
                fragment.content,
                embedding_bytes,
                fragment.indexed_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, fragment))]
    async fn upsert(&self, fragment: &Fragment) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CineRagError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        Self::insert_fragment(&conn, fragment)?;

        debug!("Upserted fragment {}", fragment.id);
        Ok(())
    }

    #[instrument(skip(self, fragments))]
    async fn upsert_batch(&self, fragments: &[Fragment]) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CineRagError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let tx = conn.unchecked_transaction()?;
        for fragment in fragments {
            Self::insert_fragment(&tx, fragment)?;
        }
        tx.commit()?;

        info!("Batch upserted {} fragments", fragments.len());
        Ok(fragments.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CineRagError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            "SELECT id, title, year, genre, rating, content, embedding, indexed_at FROM fragments",
        )?;

        let fragments = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(6)?;
            let indexed_at_str: String = row.get(7)?;

            Ok(Fragment {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                title: row.get(1)?,
                year: row.get(2)?,
                genre: row.get(3)?,
                rating: row.get(4)?,
                content: row.get(5)?,
                embedding: Self::bytes_to_embedding(&embedding_bytes),
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let mut results: Vec<SearchResult> = fragments
            .filter_map(|fragment| fragment.ok())
            .map(|fragment| {
                let score = cosine_similarity(query_embedding, &fragment.embedding);
                SearchResult { fragment, score }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn fragment_count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CineRagError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let count: usize = conn.query_row("SELECT COUNT(*) FROM fragments", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_vector_store_roundtrip() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let fragment = Fragment::new(
            "Inception".to_string(),
            "2010".to_string(),
            "Action, Adventure, Sci-Fi".to_string(),
            Some(8.8),
            "Movie: Inception, Starring: Leonardo DiCaprio".to_string(),
            vec![1.0, 0.0, 0.0],
        );

        store.upsert(&fragment).await.unwrap();
        assert_eq!(store.fragment_count().await.unwrap(), 1);

        let results = store.search(&[1.0, 0.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fragment.title, "Inception");
        assert_eq!(results[0].fragment.rating, Some(8.8));
        assert!((results[0].score - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_sqlite_batch_and_threshold() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let frags: Vec<Fragment> = (0..3)
            .map(|i| {
                let mut embedding = vec![0.0, 0.0, 0.0];
                embedding[i] = 1.0;
                Fragment::new(
                    format!("Movie {}", i),
                    "2000".to_string(),
                    "Drama".to_string(),
                    None,
                    format!("content {}", i),
                    embedding,
                )
            })
            .collect();

        assert_eq!(store.upsert_batch(&frags).await.unwrap(), 3);

        let results = store
            .search_with_threshold(&[1.0, 0.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fragment.title, "Movie 0");
    }

    #[test]
    fn test_embedding_serialization_roundtrip() {
        let original = vec![1.5f32, -2.25, 0.0, 42.0];
        let bytes = SqliteVectorStore::embedding_to_bytes(&original);
        let decoded = SqliteVectorStore::bytes_to_embedding(&bytes);
        assert_eq!(original, decoded);
    }
}
