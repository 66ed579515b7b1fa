//! podsearch - Retrieval-augmented question answering over a podcast archive
//!
//! # Overview
//!
//! podsearch allows you to:
//! - Transcribe podcast episodes listed in a manifest
//! - Cut transcripts into overlapping word windows and embed them
//! - Index the windows in OpenSearch under addressable composite keys
//! - Ask questions answered from the nearest windows and their neighbors
//!
//! # Architecture
//!
//! - `chunking` - Overlapping sliding-window chunker
//! - `embedding` - Embedding generation
//! - `embedding_store` - Per-episode embedding artifacts
//! - `index` - Vector index abstraction (OpenSearch, in-memory)
//! - `retrieval` - Two-stage retrieval with neighbor expansion
//! - `rag` - Conversation assembly and answer generation
//! - `manifest` - Episode list and transcripts
//! - `transcription` - Speech-to-text with ffmpeg splitting
//! - `pipeline` - Service wiring and batch stages
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use podsearch::config::Settings;
//! use podsearch::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     pipeline.embed_all().await?;
//!     pipeline.index_all().await?;
//!
//!     let response = pipeline.ask("What is a sled?").await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod embedding_store;
pub mod error;
pub mod index;
pub mod manifest;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod retrieval;
pub mod transcription;

pub use error::{PodsearchError, Result};
