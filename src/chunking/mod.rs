//! Transcript chunking for embedding.
//!
//! A transcript is cut into overlapping fixed-size word windows. Each window
//! becomes a [`Chunk`] addressed by `(episode_id, position)`, where `position`
//! is the zero-based emission order across the whole transcript.

mod window;

pub use window::{WindowChunker, WindowChunks, DEFAULT_WINDOW_SIZE};

use crate::index::DocumentKey;
use serde::{Deserialize, Serialize};

/// The words of one episode's transcript, in spoken order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// Episode this transcript belongs to.
    pub episode_id: String,
    /// Whitespace-separated words.
    pub words: Vec<String>,
}

impl Transcript {
    /// Create a transcript from already-split words.
    pub fn new(episode_id: impl Into<String>, words: Vec<String>) -> Self {
        Self {
            episode_id: episode_id.into(),
            words,
        }
    }

    /// Split raw transcript text on whitespace.
    pub fn from_text(episode_id: impl Into<String>, text: &str) -> Self {
        Self::new(
            episode_id,
            text.split_whitespace().map(str::to_string).collect(),
        )
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the transcript has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A window of transcript words, the unit of embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Episode the words come from.
    pub episode_id: String,
    /// Zero-based emission order within the episode.
    pub position: usize,
    /// The window's words joined with single spaces.
    pub content: String,
    /// First word index (inclusive).
    pub start_word: usize,
    /// Last word index (exclusive).
    pub end_word: usize,
}

impl Chunk {
    /// Number of words in the window.
    pub fn word_count(&self) -> usize {
        self.end_word - self.start_word
    }

    /// Composite index key for this chunk.
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(self.episode_id.clone(), self.position)
    }
}
