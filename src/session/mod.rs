//! Session persistence for CineRAG.
//!
//! Provides a trait-based interface for session store backends.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use crate::chat::Exchange;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One continuous conversation owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier, generated at session start.
    pub id: String,
    /// Owning user identifier.
    pub user_id: String,
    /// Authenticated principal that owns this session, if any.
    pub owner: Option<String>,
    /// Prior exchanges, oldest first.
    pub history: Vec<Exchange>,
    /// When the session was started.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session with an empty history.
    pub fn new(user_id: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            owner,
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Trait for session store implementations.
///
/// Stores must provide atomic read-if-exists and replace-by-key; no
/// cross-session transactions are required. Concurrent writers to the same
/// session resolve last-writer-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by its addressing pair. A session whose `user_id`
    /// does not match must not be returned.
    async fn find(&self, user_id: &str, session_id: &str) -> Result<Option<Session>>;

    /// Insert a new session document.
    async fn insert(&self, session: &Session) -> Result<()>;

    /// Replace the full history of an existing session.
    async fn replace_history(&self, session_id: &str, history: &[Exchange]) -> Result<()>;
}
