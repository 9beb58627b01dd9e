//! CineRAG - Retrieval-Augmented Movie Chat
//!
//! A chat service that answers questions about a fixed movie dataset using
//! retrieval-augmented generation, with per-session conversational context.
//!
//! # Overview
//!
//! CineRAG allows you to:
//! - Ingest a movie dataset (CSV) into a searchable vector store
//! - Start chat sessions and ask questions with bounded conversation history
//! - Serve the whole thing over a small HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `retrieval` - Retrieval-augmented completion pipeline
//! - `chat` - Session history, prompt composition, sanitization, orchestration
//! - `session` - Session persistence
//! - `auth` - Bearer-token verification seam
//! - `ingest` - Dataset ingestion pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cinerag::chat::QueryOrchestrator;
//! use cinerag::session::MemorySessionStore;
//!
//! # async fn run(backend: Arc<dyn cinerag::retrieval::CompletionBackend>) -> cinerag::Result<()> {
//! let store = Arc::new(MemorySessionStore::new());
//! let orchestrator = QueryOrchestrator::new(store, backend, 5, 120);
//!
//! let session_id = orchestrator.start_session("7", None).await?;
//! let answer = orchestrator
//!     .handle_query("7", &session_id, "Inception, who are actors in it?", None)
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod openai;
pub mod retrieval;
pub mod session;
pub mod vector_store;

pub use error::{CineRagError, Result};
