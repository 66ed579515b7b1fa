//! Configuration module for podsearch.
//!
//! Handles loading application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationSettings, IndexSettings, PromptSettings,
    RetrievalSettings, Settings, TranscriptionSettings, ENV_INDEX_PASSWORD, ENV_INDEX_URL,
    ENV_INDEX_USERNAME,
};
