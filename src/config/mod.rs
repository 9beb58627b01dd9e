//! Configuration module for CineRAG.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AuthSettings, ChatSettings, CompletionSettings, EmbeddingSettings, GeneralSettings,
    ServerSettings, SessionStoreSettings, Settings, VectorStoreSettings,
};
