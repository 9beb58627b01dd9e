//! Retrieval-augmented completion.
//!
//! Defines the completion seam the chat core depends on, plus the real
//! pipeline that retrieves movie fragments and calls the LLM.

mod pipeline;

pub use pipeline::RetrievalPipeline;

use crate::error::Result;
use async_trait::async_trait;

/// Raw output of a completion backend.
///
/// Some backends return plain text; chain-style backends wrap the answer in
/// an envelope carrying a `result` field alongside the echoed query.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Plain generated text.
    Text(String),
    /// Envelope with the answer in a `result` field.
    Enveloped { result: String },
}

/// Trait for completion backends.
///
/// The backend receives the fully composed prompt (history plus new query)
/// and is responsible for any retrieval it performs internally.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn complete(&self, prompt: &str) -> Result<Completion>;
}
