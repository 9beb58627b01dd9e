//! SQLite-based session store implementation.
//!
//! History is persisted as a JSON column; entries that fail to decode as an
//! `Exchange` are dropped on read rather than failing the whole session.

use super::{Session, SessionStore};
use crate::chat::Exchange;
use crate::error::{CineRagError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, instrument, warn};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    owner TEXT,
    history TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
"#;

/// SQLite-based session store.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Create a new SQLite session store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite session store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite session store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Decode a stored history column, dropping malformed entries.
    fn decode_history(session_id: &str, json: &str) -> Vec<Exchange> {
        let values: Vec<serde_json::Value> = match serde_json::from_str(json) {
            Ok(values) => values,
            Err(e) => {
                warn!("Discarding unreadable history for session {}: {}", session_id, e);
                return Vec::new();
            }
        };

        values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Exchange>(value) {
                Ok(exchange) => Some(exchange),
                Err(e) => {
                    warn!("Dropping malformed history entry in session {}: {}", session_id, e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self))]
    async fn find(&self, user_id: &str, session_id: &str) -> Result<Option<Session>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CineRagError::SessionStore(format!("Failed to acquire lock: {}", e)))?;

        let row = conn
            .query_row(
                "SELECT id, user_id, owner, history, created_at
                 FROM sessions WHERE id = ?1 AND user_id = ?2",
                params![session_id, user_id],
                |row| {
                    let id: String = row.get(0)?;
                    let user_id: String = row.get(1)?;
                    let owner: Option<String> = row.get(2)?;
                    let history_json: String = row.get(3)?;
                    let created_at: String = row.get(4)?;
                    Ok((id, user_id, owner, history_json, created_at))
                },
            )
            .optional()?;

        Ok(row.map(|(id, user_id, owner, history_json, created_at)| {
            let history = Self::decode_history(&id, &history_json);
            Session {
                id,
                user_id,
                owner,
                history,
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            }
        }))
    }

    #[instrument(skip(self, session))]
    async fn insert(&self, session: &Session) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CineRagError::SessionStore(format!("Failed to acquire lock: {}", e)))?;

        let history_json = serde_json::to_string(&session.history)?;

        conn.execute(
            "INSERT INTO sessions (id, user_id, owner, history, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id,
                session.user_id,
                session.owner,
                history_json,
                session.created_at.to_rfc3339(),
            ],
        )?;

        info!("Inserted session {} for user {}", session.id, session.user_id);
        Ok(())
    }

    #[instrument(skip(self, history))]
    async fn replace_history(&self, session_id: &str, history: &[Exchange]) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CineRagError::SessionStore(format!("Failed to acquire lock: {}", e)))?;

        let history_json = serde_json::to_string(history)?;

        let updated = conn.execute(
            "UPDATE sessions SET history = ?1 WHERE id = ?2",
            params![history_json, session_id],
        )?;

        if updated == 0 {
            return Err(CineRagError::NotFound(format!("session {}", session_id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_session_roundtrip() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let session = Session::new("7", Some("alice".to_string()));
        store.insert(&session).await.unwrap();

        let history = vec![
            Exchange::new("Inception, who are actors in it?", "Leonardo DiCaprio, ..."),
            Exchange::new("And who directed it?", "Christopher Nolan."),
        ];
        store.replace_history(&session.id, &history).await.unwrap();

        let found = store.find("7", &session.id).await.unwrap().unwrap();
        assert_eq!(found.owner.as_deref(), Some("alice"));
        assert_eq!(found.history, history);
    }

    #[tokio::test]
    async fn test_find_scoped_by_user() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let session = Session::new("7", None);
        store.insert(&session).await.unwrap();

        assert!(store.find("8", &session.id).await.unwrap().is_none());
        assert!(store.find("7", "other-session").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_history_entries_dropped() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let session = Session::new("7", None);
        store.insert(&session).await.unwrap();

        // Write a history with one good and one malformed entry directly.
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "UPDATE sessions SET history = ?1 WHERE id = ?2",
                params![
                    r#"[{"query":"q","answer":"a"},{"bogus":true}]"#,
                    session.id
                ],
            )
            .unwrap();
        }

        let found = store.find("7", &session.id).await.unwrap().unwrap();
        assert_eq!(found.history, vec![Exchange::new("q", "a")]);
    }

    #[tokio::test]
    async fn test_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");

        let session = Session::new("7", None);
        {
            let store = SqliteSessionStore::new(&path).unwrap();
            store.insert(&session).await.unwrap();
        }

        let store = SqliteSessionStore::new(&path).unwrap();
        assert!(store.find("7", &session.id).await.unwrap().is_some());
    }
}
