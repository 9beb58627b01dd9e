//! Command implementations.

mod ask;
mod config;
mod ingest;
mod init;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use ingest::run_ingest;
pub use init::run_init;
pub use serve::run_serve;

use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{CineRagError, Result};
use crate::retrieval::{CompletionBackend, RetrievalPipeline};
use crate::session::{MemorySessionStore, SessionStore, SqliteSessionStore};
use crate::vector_store::{MemoryVectorStore, SqliteVectorStore, VectorStore};
use std::sync::Arc;

/// Build the configured vector store backend.
pub(crate) fn build_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.vector_store_path())?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        other => Err(CineRagError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Build the configured session store backend.
pub(crate) fn build_session_store(settings: &Settings) -> Result<Arc<dyn SessionStore>> {
    match settings.session_store.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteSessionStore::new(&settings.session_store_path())?)),
        "memory" => Ok(Arc::new(MemorySessionStore::new())),
        other => Err(CineRagError::Config(format!(
            "Unknown session store provider: {}",
            other
        ))),
    }
}

/// Build the retrieval-augmented completion backend from settings.
pub(crate) fn build_backend(
    settings: &Settings,
    vector_store: Arc<dyn VectorStore>,
    model_override: Option<String>,
) -> Arc<dyn CompletionBackend> {
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));

    let model = model_override.unwrap_or_else(|| settings.completion.model.clone());

    let api_key = settings
        .completion
        .api_key_env
        .as_deref()
        .and_then(|var| std::env::var(var).ok());

    let pipeline = RetrievalPipeline::new(vector_store, embedder, &model)
        .with_endpoint(settings.completion.api_base.as_deref(), api_key.as_deref())
        .with_temperature(settings.completion.temperature)
        .with_retrieval(
            settings.completion.max_fragments as usize,
            settings.completion.min_score,
        );

    Arc::new(pipeline)
}
