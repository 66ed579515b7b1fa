//! Archive manifest: the episodes known to podsearch and their transcripts.
//!
//! The manifest lives in the data directory as `manifest.json`. Downloading
//! audio and filling in episode metadata happens outside podsearch; the
//! transcription step fills in `transcript`.

use crate::chunking::Transcript;
use crate::error::{PodsearchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the manifest inside the data directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One podcast episode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeData {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Audio file name, relative to the data directory.
    pub filename: String,
    pub guid: String,
    pub published: String,
    /// Full transcript text; empty until transcribed.
    pub transcript: String,
}

impl EpisodeData {
    /// Whether a transcript has been recorded.
    pub fn is_transcribed(&self) -> bool {
        !self.transcript.trim().is_empty()
    }

    /// The transcript split into words.
    pub fn transcript(&self) -> Transcript {
        Transcript::from_text(self.guid.clone(), &self.transcript)
    }
}

/// All episodes in the archive, keyed by GUID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub last_updated: Option<DateTime<Utc>>,
    pub episodes: BTreeMap<String, EpisodeData>,
}

impl Manifest {
    /// Manifest path inside a data directory.
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(MANIFEST_FILE)
    }

    /// Load the manifest from a data directory; a missing file is an empty archive.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path_in(data_dir);
        if !path.exists() {
            debug!("No manifest at {}, starting empty", path.display());
            return Ok(Manifest::default());
        }

        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| {
            PodsearchError::Manifest(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Write the manifest, stamping `last_updated`.
    pub fn save(&mut self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        self.last_updated = Some(Utc::now());

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path_in(data_dir), content)?;
        Ok(())
    }

    pub fn get(&self, guid: &str) -> Result<&EpisodeData> {
        self.episodes
            .get(guid)
            .ok_or_else(|| PodsearchError::EpisodeNotFound(guid.to_string()))
    }

    /// Add or replace an episode.
    pub fn upsert(&mut self, episode: EpisodeData) {
        self.episodes.insert(episode.guid.clone(), episode);
    }

    /// Record an episode's transcript.
    pub fn set_transcript(&mut self, guid: &str, transcript: String) -> Result<()> {
        let episode = self
            .episodes
            .get_mut(guid)
            .ok_or_else(|| PodsearchError::EpisodeNotFound(guid.to_string()))?;
        episode.transcript = transcript;
        Ok(())
    }

    /// Episodes still waiting for a transcript.
    pub fn pending_transcription(&self) -> impl Iterator<Item = &EpisodeData> {
        self.episodes.values().filter(|e| !e.is_transcribed())
    }

    /// Episodes that have a transcript.
    pub fn transcribed(&self) -> impl Iterator<Item = &EpisodeData> {
        self.episodes.values().filter(|e| e.is_transcribed())
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(guid: &str, transcript: &str) -> EpisodeData {
        EpisodeData {
            title: format!("Episode {}", guid),
            guid: guid.to_string(),
            filename: format!("{}.mp3", guid),
            transcript: transcript.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::load(dir.path()).unwrap();
        assert!(manifest.is_empty());
        assert!(manifest.last_updated.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::default();
        manifest.upsert(episode("a", "hello there"));
        manifest.upsert(episode("b", ""));
        manifest.save(dir.path()).unwrap();

        let loaded = Manifest::load(dir.path()).unwrap();
        assert_eq!(loaded, manifest);
        assert!(loaded.last_updated.is_some());
        assert_eq!(loaded.get("a").unwrap().transcript().len(), 2);
    }

    #[test]
    fn test_malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Manifest::path_in(dir.path()), "[1, 2").unwrap();

        let err = Manifest::load(dir.path()).unwrap_err();
        assert!(matches!(err, PodsearchError::Manifest(_)));
    }

    #[test]
    fn test_transcription_state() {
        let mut manifest = Manifest::default();
        manifest.upsert(episode("a", "words"));
        manifest.upsert(episode("b", "   "));

        let pending: Vec<&str> = manifest.pending_transcription().map(|e| e.guid.as_str()).collect();
        assert_eq!(pending, vec!["b"]);

        manifest.set_transcript("b", "now transcribed".to_string()).unwrap();
        assert_eq!(manifest.pending_transcription().count(), 0);
        assert_eq!(manifest.transcribed().count(), 2);

        assert!(matches!(
            manifest.set_transcript("zzz", String::new()),
            Err(PodsearchError::EpisodeNotFound(_))
        ));
    }
}
