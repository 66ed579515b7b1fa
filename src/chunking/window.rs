//! Overlapping sliding-window chunker.
//!
//! For each base index `i` (stepping by the window size `W` while
//! `i < len - W`) up to three windows are emitted, in this order:
//!
//! - primary: `[i, i + W)`
//! - forward-shifted: `[i + W/2, i + W + W/2)`, straddling the primary's right
//!   edge, emitted only when the loop takes another step after this one
//! - backward-shifted: `[i - W/2, i + W/2)`, straddling the primary's left
//!   edge, emitted only when `i > W`
//!
//! Transcripts of `W` words or fewer produce no chunks.

use super::{Chunk, Transcript};
use crate::error::{PodsearchError, Result};

/// Default window size in words.
pub const DEFAULT_WINDOW_SIZE: usize = 500;

/// Word-window chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowChunker {
    window_size: usize,
}

impl WindowChunker {
    /// Create a chunker with the given window size in words.
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(PodsearchError::InvalidInput(
                "chunk window size must be at least one word".to_string(),
            ));
        }
        Ok(Self { window_size })
    }

    /// Window size in words.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Lazily chunk a transcript.
    pub fn chunks<'a>(&self, transcript: &'a Transcript) -> WindowChunks<'a> {
        WindowChunks {
            episode_id: &transcript.episode_id,
            words: &transcript.words,
            window: self.window_size,
            half: self.window_size / 2,
            base: 0,
            phase: Phase::Primary,
            next_position: 0,
        }
    }

    /// Chunk a transcript into a vector.
    pub fn chunk(&self, transcript: &Transcript) -> Vec<Chunk> {
        self.chunks(transcript).collect()
    }
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Primary,
    Forward,
    Backward,
}

/// Iterator over the chunks of one transcript.
#[derive(Debug, Clone)]
pub struct WindowChunks<'a> {
    episode_id: &'a str,
    words: &'a [String],
    window: usize,
    half: usize,
    base: usize,
    phase: Phase,
    next_position: usize,
}

impl WindowChunks<'_> {
    fn in_loop(&self, base: usize) -> bool {
        let len = self.words.len();
        len > self.window && base < len - self.window
    }

    fn emit(&mut self, start: usize, end: usize) -> Chunk {
        let chunk = Chunk {
            episode_id: self.episode_id.to_string(),
            position: self.next_position,
            content: self.words[start..end].join(" "),
            start_word: start,
            end_word: end,
        };
        self.next_position += 1;
        chunk
    }
}

impl Iterator for WindowChunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let len = self.words.len();
        let (w, half) = (self.window, self.half);

        while self.in_loop(self.base) {
            let i = self.base;
            match self.phase {
                Phase::Primary => {
                    self.phase = Phase::Forward;
                    if i + w <= len {
                        return Some(self.emit(i, i + w));
                    }
                }
                Phase::Forward => {
                    self.phase = Phase::Backward;
                    if self.in_loop(i + w) && i + w + half <= len {
                        return Some(self.emit(i + half, i + w + half));
                    }
                }
                Phase::Backward => {
                    self.phase = Phase::Primary;
                    self.base += w;
                    if i > w {
                        return Some(self.emit(i - half, i + half));
                    }
                }
            }
        }

        None
    }
}
