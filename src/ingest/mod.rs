//! Dataset ingestion pipeline.
//!
//! One-shot batch job that reads the movie dataset CSV, formats each row
//! into fragment text, splits it into chunks, embeds the chunks, and upserts
//! them into the vector store.

use crate::embedding::Embedder;
use crate::error::{CineRagError, Result};
use crate::vector_store::{Fragment, VectorStore};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Character budget per chunk.
const CHUNK_SIZE: usize = 1000;
/// Characters carried over between adjacent chunks.
const CHUNK_OVERLAP: usize = 50;
/// Rows embedded per API call.
const EMBED_BATCH: usize = 64;

/// One row of the movie dataset CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "Series_Title")]
    pub title: String,
    #[serde(rename = "Released_Year")]
    pub year: String,
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "IMDB_Rating")]
    pub rating: Option<f64>,
    #[serde(rename = "Director")]
    pub director: String,
    #[serde(rename = "Overview")]
    pub overview: String,
    #[serde(rename = "Star1")]
    pub star1: String,
    #[serde(rename = "Star2")]
    pub star2: String,
    #[serde(rename = "Star3")]
    pub star3: String,
    #[serde(rename = "Star4")]
    pub star4: String,
}

impl MovieRecord {
    /// Format the row into the text fragment that gets embedded.
    pub fn fragment_text(&self) -> String {
        format!(
            "Movie: {}, Released: {}, Genre: {}, Rating: {}, Director: {}, Overview: {} \
             Starring: {}, {}, {}, {}.",
            self.title,
            self.year,
            self.genre,
            self.rating.map_or_else(|| "N/A".to_string(), |r| r.to_string()),
            self.director,
            self.overview,
            self.star1,
            self.star2,
            self.star3,
            self.star4,
        )
    }
}

/// Split text into chunks of at most `size` characters with `overlap`
/// characters carried over, preferring to break at newlines.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + size).min(chars.len());

        // Break at the last newline inside the window, if any.
        let cut = if end < chars.len() {
            chars[start..end]
                .iter()
                .rposition(|&c| c == '\n')
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        let chunk: String = chars[start..cut].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if cut >= chars.len() {
            break;
        }
        start = cut.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Coordinates the CSV → chunks → embeddings → vector store pipeline.
pub struct Ingestor {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    show_progress: bool,
}

/// Summary of one ingest run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Rows read from the CSV.
    pub rows: usize,
    /// Fragments written to the vector store.
    pub fragments_indexed: usize,
}

impl Ingestor {
    /// Create a new ingestor.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            show_progress: false,
        }
    }

    /// Show a terminal progress bar during ingestion.
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    /// Run the full ingest pipeline on a dataset CSV.
    #[instrument(skip(self))]
    pub async fn run(&self, csv_path: &Path) -> Result<IngestReport> {
        let mut reader = csv::Reader::from_path(csv_path)?;

        let mut records = Vec::new();
        for result in reader.deserialize::<MovieRecord>() {
            records.push(result?);
        }

        if records.is_empty() {
            return Err(CineRagError::Ingest(format!(
                "No rows found in {}",
                csv_path.display()
            )));
        }

        info!("Read {} movie rows from {}", records.len(), csv_path.display());

        // Pair each chunk with its source row so fragment metadata survives
        // the splitting.
        let mut chunked: Vec<(usize, String)> = Vec::new();
        for (row, record) in records.iter().enumerate() {
            for chunk in split_text(&record.fragment_text(), CHUNK_SIZE, CHUNK_OVERLAP) {
                chunked.push((row, chunk));
            }
        }

        let progress = if self.show_progress {
            let pb = ProgressBar::new(chunked.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            pb.set_message("Embedding fragments");
            Some(pb)
        } else {
            None
        };

        let mut fragments_indexed = 0;
        for batch in chunked.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let fragments: Vec<Fragment> = batch
                .iter()
                .zip(embeddings)
                .map(|((row, text), embedding)| {
                    let record = &records[*row];
                    Fragment::new(
                        record.title.clone(),
                        record.year.clone(),
                        record.genre.clone(),
                        record.rating,
                        text.clone(),
                        embedding,
                    )
                })
                .collect();

            fragments_indexed += self.vector_store.upsert_batch(&fragments).await?;

            if let Some(pb) = &progress {
                pb.inc(batch.len() as u64);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        info!("Indexed {} fragments from {} rows", fragments_indexed, records.len());

        Ok(IngestReport {
            rows: records.len(),
            fragments_indexed,
        })
    }
}
