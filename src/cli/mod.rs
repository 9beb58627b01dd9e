//! CLI module for CineRAG.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// CineRAG - Retrieval-Augmented Movie Chat
///
/// A chat service that answers questions about a movie dataset using
/// retrieval-augmented generation.
#[derive(Parser, Debug)]
#[command(name = "cinerag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file and create data directories
    Init,

    /// Ingest a movie dataset CSV into the vector store
    Ingest {
        /// Path to the dataset CSV
        csv: String,
    },

    /// Ask a one-shot question (ephemeral session)
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start the HTTP chat API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
