//! The retrieval-augmented completion pipeline.

use super::{Completion, CompletionBackend};
use crate::embedding::Embedder;
use crate::error::{CineRagError, Result};
use crate::openai::create_client_for;
use crate::vector_store::{SearchResult, VectorStore};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const SYSTEM_PROMPT: &str = "You are a movie expert. Answer the user's question using only the \
provided movie context. The conversation so far is included in the question; use it to resolve \
references like \"it\" or \"that movie\". If the context does not contain the answer, say so.";

/// Completion backend that retrieves movie fragments and stuffs them into a
/// chat completion request.
pub struct RetrievalPipeline {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    model: String,
    temperature: f32,
    max_fragments: usize,
    min_score: f32,
}

impl RetrievalPipeline {
    /// Create a new retrieval pipeline.
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        model: &str,
    ) -> Self {
        Self {
            client: create_client_for(None, None),
            vector_store,
            embedder,
            model: model.to_string(),
            temperature: 0.5,
            max_fragments: 4,
            min_score: 0.3,
        }
    }

    /// Point the pipeline at an alternate OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, base_url: Option<&str>, api_key: Option<&str>) -> Self {
        self.client = create_client_for(base_url, api_key);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set retrieval limits.
    pub fn with_retrieval(mut self, max_fragments: usize, min_score: f32) -> Self {
        self.max_fragments = max_fragments;
        self.min_score = min_score;
        self
    }

    async fn retrieve(&self, prompt: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(prompt).await?;
        self.vector_store
            .search_with_threshold(&query_embedding, self.max_fragments, self.min_score)
            .await
    }
}

/// Format retrieved fragments for the completion request.
fn format_fragments(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] {}", i + 1, r.fragment.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl CompletionBackend for RetrievalPipeline {
    #[instrument(skip(self, prompt))]
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let results = self.retrieve(prompt).await?;
        debug!("Retrieved {} fragments", results.len());

        let user_content = if results.is_empty() {
            format!("{}\n\n(No relevant movie context found)", prompt)
        } else {
            format!(
                "{}\n\nMovie context:\n{}",
                prompt,
                format_fragments(&results)
            )
        };

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| CineRagError::Upstream(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_content)
                .build()
                .map_err(|e| CineRagError::Upstream(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| CineRagError::Upstream(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| CineRagError::Upstream(format!("Completion API error: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| CineRagError::Upstream("Empty response from LLM".to_string()))?
            .clone();

        info!("Generated completion with {} context fragments", results.len());

        Ok(Completion::Text(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::Fragment;

    #[test]
    fn test_format_fragments() {
        let results = vec![
            SearchResult {
                fragment: Fragment::new(
                    "Inception".into(),
                    "2010".into(),
                    "Sci-Fi".into(),
                    Some(8.8),
                    "Movie: Inception, Starring: Leonardo DiCaprio".into(),
                    vec![],
                ),
                score: 0.9,
            },
            SearchResult {
                fragment: Fragment::new(
                    "Interstellar".into(),
                    "2014".into(),
                    "Sci-Fi".into(),
                    Some(8.6),
                    "Movie: Interstellar, Starring: Matthew McConaughey".into(),
                    vec![],
                ),
                score: 0.7,
            },
        ];

        let formatted = format_fragments(&results);
        assert!(formatted.starts_with("[1] Movie: Inception"));
        assert!(formatted.contains("\n[2] Movie: Interstellar"));
    }
}
