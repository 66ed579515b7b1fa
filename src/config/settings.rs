//! Configuration settings for podsearch.

use crate::embedding_store::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding `index.url`.
pub const ENV_INDEX_URL: &str = "PODSEARCH_INDEX_URL";
/// Environment variable overriding `index.username`.
pub const ENV_INDEX_USERNAME: &str = "PODSEARCH_INDEX_USERNAME";
/// Environment variable overriding `index.password`.
pub const ENV_INDEX_PASSWORD: &str = "PODSEARCH_INDEX_PASSWORD";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub transcription: TranscriptionSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory holding the manifest, audio files and embedding artifacts.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.podsearch/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Chunking and embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Window size in words used by the chunker.
    pub window_size: usize,
    /// What to do when a single chunk fails to embed.
    pub failure_policy: FailurePolicy,
    /// Maximum in-flight embedding calls per episode.
    pub max_concurrent: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            window_size: 500,
            failure_policy: FailurePolicy::BestEffort,
            max_concurrent: 1,
        }
    }
}

/// Vector index (OpenSearch) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Base URL of the OpenSearch cluster.
    pub url: String,
    /// Index name holding the embedded chunks.
    pub index_name: String,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Accept self-signed certificates (local clusters only).
    pub accept_invalid_certs: bool,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            url: "https://localhost:9200".to_string(),
            index_name: "oxide".to_string(),
            username: None,
            password: None,
            accept_invalid_certs: false,
            timeout_seconds: 30,
        }
    }
}

/// Two-stage retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalSettings {
    /// `size` of the k-NN search request.
    pub search_size: usize,
    /// `k` of the k-NN search request.
    pub top_k: usize,
    /// Cap on documents returned by neighbor expansion.
    pub max_neighbor_segments: usize,
    /// How many positions on each side of a hit to fetch.
    pub neighbor_radius: usize,
    /// Drop neighbor keys that duplicate a hit or another neighbor.
    pub dedup_neighbors: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            search_size: 10,
            top_k: 2,
            max_neighbor_segments: 20,
            neighbor_radius: 1,
            dedup_neighbors: false,
        }
    }
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the completion.
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo-preview".to_string(),
            temperature: 0.6,
            max_tokens: 300,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Language hint passed to Whisper.
    pub language: String,
    /// Upload size limit; larger files are split first.
    pub max_upload_mb: u64,
    /// Length of each split segment in seconds.
    pub segment_seconds: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: "en".to_string(),
            max_upload_mb: 25,
            segment_seconds: 1200,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// TOML file overriding the default prompts.
    pub custom_file: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Index connection values from the environment take precedence over the file.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply index overrides using the given variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_INDEX_URL).filter(|v| !v.is_empty()) {
            self.index.url = url;
        }
        if let Some(username) = lookup(ENV_INDEX_USERNAME).filter(|v| !v.is_empty()) {
            self.index.username = Some(username);
        }
        if let Some(password) = lookup(ENV_INDEX_PASSWORD).filter(|v| !v.is_empty()) {
            self.index.password = Some(password);
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podsearch")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_archive_layout() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.window_size, 500);
        assert_eq!(settings.embedding.failure_policy, FailurePolicy::BestEffort);
        assert_eq!(settings.retrieval.search_size, 10);
        assert_eq!(settings.retrieval.top_k, 2);
        assert_eq!(settings.retrieval.max_neighbor_segments, 20);
        assert!(!settings.retrieval.dedup_neighbors);
        assert_eq!(settings.index.index_name, "oxide");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [embedding]
            window_size = 250
            failure_policy = "fail_fast"

            [retrieval]
            dedup_neighbors = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.embedding.window_size, 250);
        assert_eq!(settings.embedding.failure_policy, FailurePolicy::FailFast);
        assert_eq!(settings.embedding.model, "text-embedding-ada-002");
        assert!(settings.retrieval.dedup_neighbors);
        assert_eq!(settings.retrieval.top_k, 2);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(|key| match key {
            ENV_INDEX_URL => Some("https://search.internal:9200".to_string()),
            ENV_INDEX_PASSWORD => Some("hunter2".to_string()),
            ENV_INDEX_USERNAME => Some(String::new()),
            _ => None,
        });

        assert_eq!(settings.index.url, "https://search.internal:9200");
        assert_eq!(settings.index.password.as_deref(), Some("hunter2"));
        assert_eq!(settings.index.username, None);
    }

    #[test]
    fn test_rendered_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.generation.max_tokens = 512;
        std::fs::write(&path, toml::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.generation.max_tokens, 512);
    }
}
