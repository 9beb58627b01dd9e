//! In-memory session store implementation.
//!
//! Useful for testing and one-shot CLI queries.

use super::{Session, SessionStore};
use crate::chat::Exchange;
use crate::error::{CineRagError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory session store.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Create a new in-memory session store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find(&self, user_id: &str, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions
            .get(session_id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn replace_history(&self, session_id: &str, history: &[Exchange]) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| CineRagError::NotFound(format!("session {}", session_id)))?;
        session.history = history.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemorySessionStore::new();
        let session = Session::new("7", None);
        store.insert(&session).await.unwrap();

        let found = store.find("7", &session.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, "7");
        assert!(found.history.is_empty());
    }

    #[tokio::test]
    async fn test_find_mismatched_user_returns_none() {
        let store = MemorySessionStore::new();
        let session = Session::new("7", None);
        store.insert(&session).await.unwrap();

        assert!(store.find("8", &session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_history() {
        let store = MemorySessionStore::new();
        let session = Session::new("7", None);
        store.insert(&session).await.unwrap();

        let history = vec![Exchange::new("q", "a")];
        store.replace_history(&session.id, &history).await.unwrap();

        let found = store.find("7", &session.id).await.unwrap().unwrap();
        assert_eq!(found.history, history);
    }

    #[tokio::test]
    async fn test_replace_history_missing_session() {
        let store = MemorySessionStore::new();
        let err = store.replace_history("nope", &[]).await.unwrap_err();
        assert!(matches!(err, CineRagError::NotFound(_)));
    }
}
