//! Ask command implementation.

use super::{build_backend, build_vector_store};
use crate::chat::QueryOrchestrator;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::MemorySessionStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command: one question in an ephemeral session.
pub async fn run_ask(question: &str, model: Option<String>, settings: Settings) -> Result<()> {
    let vector_store = build_vector_store(&settings)?;

    if vector_store.fragment_count().await? == 0 {
        Output::warning("The vector store is empty. Run 'cinerag ingest <csv>' first.");
    }

    let backend = build_backend(&settings, vector_store, model);
    let store = Arc::new(MemorySessionStore::new());

    let orchestrator = QueryOrchestrator::new(
        store,
        backend,
        settings.chat.history_window,
        settings.completion.timeout_seconds,
    );

    let session_id = orchestrator.start_session("cli", None).await?;

    match orchestrator.handle_query("cli", &session_id, question, None).await {
        Ok(answer) => {
            println!("\n{}\n", answer);
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
