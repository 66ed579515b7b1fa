//! Per-episode embedding artifacts on disk.

use super::EmbeddedChunk;
use crate::error::{PodsearchError, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Directory of `<episode>.embeddings.json` files.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact path for an episode.
    pub fn path(&self, episode_id: &str) -> PathBuf {
        self.dir.join(format!("{}.embeddings.json", episode_id))
    }

    /// Whether an episode's artifact has been written.
    pub fn exists(&self, episode_id: &str) -> bool {
        self.path(episode_id).exists()
    }

    /// Load an episode's embedded chunks, in stored order.
    pub fn load(&self, episode_id: &str) -> Result<Vec<EmbeddedChunk>> {
        let path = self.path(episode_id);
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| PodsearchError::Artifact {
            path,
            reason: e.to_string(),
        })
    }

    /// Write an episode's artifact.
    ///
    /// The file appears atomically, so a crash mid-write never leaves
    /// something that looks like a finished episode.
    pub fn save(&self, episode_id: &str, chunks: &[EmbeddedChunk]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(episode_id);

        let content = serde_json::to_vec_pretty(chunks)?;
        let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;
        file.write_all(&content)?;
        file.persist(&path).map_err(|e| PodsearchError::Io(e.error))?;

        debug!("Wrote {} embedded chunks to {}", chunks.len(), path.display());
        Ok(path)
    }
}
