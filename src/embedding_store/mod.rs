//! Persisted embeddings, one artifact file per episode.
//!
//! An artifact's existence marks its episode as done: a rebuild skips the
//! episode entirely, even if the artifact is missing chunks that failed to
//! embed the first time.

mod artifact;
mod builder;

pub use artifact::ArtifactStore;
pub use builder::{BuildOutcome, EmbeddingBuilder};

use crate::chunking::Chunk;
use crate::index::DocumentKey;
use serde::{Deserialize, Serialize};

/// A chunk together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    /// Episode the chunk belongs to.
    pub episode_id: String,
    /// Sequence position assigned by the chunker.
    pub position: usize,
    /// Model that produced the vector.
    pub model: String,
    /// Window size the chunker ran with.
    pub window_size: usize,
    /// Chunk text.
    pub content: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    /// Pair a chunk with its vector.
    pub fn new(chunk: Chunk, vector: Vec<f32>, model: &str, window_size: usize) -> Self {
        Self {
            episode_id: chunk.episode_id,
            position: chunk.position,
            model: model.to_string(),
            window_size,
            content: chunk.content,
            vector,
        }
    }

    /// Composite index key.
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(self.episode_id.clone(), self.position)
    }
}

/// What to do when a single chunk fails to embed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, omit the chunk, and keep going.
    #[default]
    BestEffort,
    /// Abort the episode without writing an artifact.
    FailFast,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(FailurePolicy::BestEffort),
            "fail_fast" => Ok(FailurePolicy::FailFast),
            _ => Err(format!("Unknown failure policy: {}", s)),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::BestEffort => write!(f, "best_effort"),
            FailurePolicy::FailFast => write!(f, "fail_fast"),
        }
    }
}
