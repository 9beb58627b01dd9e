//! Session-scoped conversational chat core.
//!
//! Holds the bounded history window, prompt composition, response
//! sanitization, and the per-query orchestration that ties them to the
//! session store and completion backend.

pub mod history;
pub mod orchestrator;
pub mod prompt;
pub mod sanitize;

pub use history::append_and_trim;
pub use orchestrator::QueryOrchestrator;
pub use prompt::compose;
pub use sanitize::sanitize;

use serde::{Deserialize, Serialize};

/// One user query paired with the system's answer.
///
/// Immutable once created; ordering among exchanges within a session is
/// chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// The user's query text.
    pub query: String,
    /// The sanitized answer text.
    pub answer: String,
}

impl Exchange {
    /// Create a new exchange.
    pub fn new(query: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer: answer.into(),
        }
    }
}
