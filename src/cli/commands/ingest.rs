//! Ingest command implementation.

use super::build_vector_store;
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::ingest::Ingestor;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the ingest command.
pub async fn run_ingest(csv: &str, settings: Settings) -> Result<()> {
    let csv_path = Path::new(csv);
    if !csv_path.exists() {
        Output::error(&format!("Dataset not found: {}", csv));
        anyhow::bail!("dataset not found: {}", csv);
    }

    let vector_store = build_vector_store(&settings)?;
    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));

    let ingestor = Ingestor::new(vector_store, embedder).with_progress();

    Output::info(&format!("Ingesting {}", csv));
    let report = ingestor.run(csv_path).await?;

    Output::success(&format!(
        "Indexed {} fragments from {} movies",
        report.fragments_indexed, report.rows
    ));

    Ok(())
}
