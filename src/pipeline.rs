//! Pipeline for podsearch.
//!
//! The single place where service handles are constructed. Every stage takes
//! the handles it needs from here: transcription fills the manifest, the
//! embedding build writes one artifact per episode, indexing uploads the
//! artifacts, and the RAG engine answers questions against the index.

use crate::chunking::WindowChunker;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::embedding_store::{ArtifactStore, BuildOutcome, EmbeddingBuilder};
use crate::error::{PodsearchError, Result};
use crate::index::{DocumentKey, IndexDocument, OpenSearchIndex, SearchIndex};
use crate::manifest::{EpisodeData, Manifest};
use crate::rag::{Generator, OpenAIGenerator, RagEngine, RagResponse};
use crate::retrieval::{RetrievalResult, Retriever};
use crate::transcription::{transcribe_parts, AudioSplitter, Transcriber, WhisperTranscriber};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Counts from an embedding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedSummary {
    pub built: usize,
    pub skipped: usize,
    pub untranscribed: usize,
    pub embedded: usize,
    pub failed: usize,
}

impl EmbedSummary {
    fn record(&mut self, outcome: &BuildOutcome) {
        match outcome {
            BuildOutcome::Skipped => self.skipped += 1,
            BuildOutcome::Built { embedded, failed, .. } => {
                self.built += 1;
                self.embedded += embedded;
                self.failed += failed;
            }
        }
    }
}

/// Counts from an index run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub episodes: usize,
    pub documents: usize,
}

/// The podsearch pipeline.
pub struct Pipeline {
    settings: Settings,
    prompts: Prompts,
    data_dir: PathBuf,
    transcriber: Arc<dyn Transcriber>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn SearchIndex>,
    generator: Arc<dyn Generator>,
}

impl Pipeline {
    /// Create a pipeline backed by OpenAI and OpenSearch.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_file.as_deref())?;

        let transcriber = Arc::new(WhisperTranscriber::new(&settings.transcription)?);
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);
        let index = Arc::new(OpenSearchIndex::new(&settings.index)?);
        let generator = Arc::new(OpenAIGenerator::new(settings.generation.clone())?);

        Self::with_components(settings, prompts, transcriber, embedder, index, generator)
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        transcriber: Arc<dyn Transcriber>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn SearchIndex>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let data_dir = settings.data_dir();
        std::fs::create_dir_all(&data_dir)?;

        Ok(Self {
            settings,
            prompts,
            data_dir,
            transcriber,
            embedder,
            index,
            generator,
        })
    }

    /// Load the archive manifest.
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.data_dir)
    }

    /// Store of per-episode embedding artifacts.
    pub fn artifacts(&self) -> ArtifactStore {
        ArtifactStore::new(&self.data_dir)
    }

    fn builder(&self) -> Result<EmbeddingBuilder> {
        let chunker = WindowChunker::new(self.settings.embedding.window_size)?;
        Ok(
            EmbeddingBuilder::new(self.embedder.clone(), self.artifacts(), chunker)
                .with_policy(self.settings.embedding.failure_policy)
                .with_max_concurrent(self.settings.embedding.max_concurrent),
        )
    }

    /// Transcribe one episode's audio, splitting it when oversized.
    #[instrument(skip(self, episode), fields(episode = %episode.guid))]
    pub async fn transcribe_episode(&self, episode: &EpisodeData) -> Result<String> {
        let splitter = AudioSplitter::new(
            &self.data_dir,
            self.settings.transcription.max_upload_mb,
            self.settings.transcription.segment_seconds,
        );
        let parts = splitter.parts(&episode.guid, &episode.filename).await?;
        info!("Transcribing {} audio part(s)", parts.len());

        transcribe_parts(self.transcriber.as_ref(), &parts).await
    }

    /// Transcribe every episode without a transcript.
    ///
    /// The manifest is saved after each episode, so an interrupted run resumes
    /// where it stopped. Returns the number of episodes transcribed.
    pub async fn transcribe_pending(&self) -> Result<usize> {
        let mut manifest = self.manifest()?;
        let pending: Vec<EpisodeData> = manifest.pending_transcription().cloned().collect();
        info!("{} episode(s) need transcription", pending.len());

        for episode in &pending {
            let transcript = self.transcribe_episode(episode).await?;
            manifest.set_transcript(&episode.guid, transcript)?;
            manifest.save(&self.data_dir)?;
        }

        Ok(pending.len())
    }

    /// Build the embedding artifact for one episode.
    pub async fn embed_episode(&self, episode: &EpisodeData) -> Result<BuildOutcome> {
        self.builder()?.build_episode(&episode.transcript()).await
    }

    /// Build embedding artifacts for every transcribed episode.
    pub async fn embed_all(&self) -> Result<EmbedSummary> {
        let manifest = self.manifest()?;
        let mut summary = EmbedSummary::default();

        for episode in manifest.episodes.values() {
            if !episode.is_transcribed() {
                warn!(episode = %episode.guid, "No transcript yet, not embedding");
                summary.untranscribed += 1;
                continue;
            }
            let outcome = self.embed_episode(episode).await?;
            summary.record(&outcome);
        }

        info!(
            "Embedding finished: {} built, {} skipped, {} chunks failed",
            summary.built, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    /// Upload one episode's artifact to the index. Returns the documents written.
    #[instrument(skip(self, episode), fields(episode = %episode.guid))]
    pub async fn index_episode(&self, episode: &EpisodeData) -> Result<usize> {
        let artifacts = self.artifacts();
        if !artifacts.exists(&episode.guid) {
            return Err(PodsearchError::Artifact {
                path: artifacts.path(&episode.guid),
                reason: format!(
                    "missing for episode {} ({}); run embed first",
                    episode.guid, episode.title
                ),
            });
        }

        let chunks = artifacts.load(&episode.guid)?;
        for chunk in &chunks {
            let doc = IndexDocument {
                title: episode.title.clone(),
                guid: episode.guid.clone(),
                published: episode.published.clone(),
                link: episode.link.clone(),
                description: episode.description.clone(),
                transcript_chunk_text: chunk.content.clone(),
                vector_id: chunk.position,
                vector_data: chunk.vector.clone(),
            };
            self.index
                .upsert(&DocumentKey::new(episode.guid.clone(), chunk.position), &doc)
                .await?;
        }

        info!("Indexed {} documents", chunks.len());
        Ok(chunks.len())
    }

    /// Create the index if needed and upload every transcribed episode.
    pub async fn index_all(&self) -> Result<IndexSummary> {
        self.index.ensure_index(self.embedder.dimensions()).await?;

        let manifest = self.manifest()?;
        let mut summary = IndexSummary::default();
        for episode in manifest.transcribed() {
            summary.documents += self.index_episode(episode).await?;
            summary.episodes += 1;
        }
        Ok(summary)
    }

    /// Create a RAG engine over the index.
    pub fn engine(&self) -> RagEngine {
        let retriever = Retriever::new(self.index.clone(), self.settings.retrieval.clone());
        RagEngine::new(self.embedder.clone(), retriever, self.generator.clone())
            .with_prompts(self.prompts.clone())
    }

    /// Retrieve context for a question without generating an answer.
    pub async fn search(&self, question: &str) -> Result<RetrievalResult> {
        self.engine().retrieve(question).await
    }

    /// Answer a question from the archive.
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        self.engine().ask(question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;
    use crate::rag::ChatMessage;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TRANSCRIPT: &str = "rack";

    /// Returns a fixed transcript of 30 words and counts calls.
    #[derive(Default)]
    struct FixedTranscriber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![TRANSCRIPT; 30].join(" "))
        }
    }

    /// Embeds every text onto the same axis.
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model(&self) -> &str {
            "axis"
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            Ok(format!("{} messages", messages.len()))
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    fn episode(guid: &str, transcript: &str) -> EpisodeData {
        EpisodeData {
            title: format!("Episode {}", guid),
            link: format!("https://example.com/{}", guid),
            filename: format!("{}.mp3", guid),
            guid: guid.to_string(),
            transcript: transcript.to_string(),
            ..Default::default()
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        pipeline: Pipeline,
        transcriber: Arc<FixedTranscriber>,
        index: Arc<MemoryIndex>,
    }

    fn fixture(episodes: Vec<EpisodeData>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().to_string_lossy().to_string();
        settings.embedding.window_size = 10;

        let mut manifest = Manifest::default();
        for episode in episodes {
            std::fs::write(dir.path().join(&episode.filename), b"audio").unwrap();
            manifest.upsert(episode);
        }
        manifest.save(dir.path()).unwrap();

        let transcriber = Arc::new(FixedTranscriber::default());
        let index = Arc::new(MemoryIndex::new());
        let pipeline = Pipeline::with_components(
            settings,
            Prompts::default(),
            transcriber.clone(),
            Arc::new(AxisEmbedder),
            index.clone(),
            Arc::new(EchoGenerator),
        )
        .unwrap();

        Fixture {
            _dir: dir,
            pipeline,
            transcriber,
            index,
        }
    }

    #[tokio::test]
    async fn test_transcribe_pending_fills_manifest_once() {
        let fx = fixture(vec![episode("a", "already here"), episode("b", "")]);

        assert_eq!(fx.pipeline.transcribe_pending().await.unwrap(), 1);
        assert_eq!(fx.transcriber.calls.load(Ordering::SeqCst), 1);

        let manifest = fx.pipeline.manifest().unwrap();
        assert_eq!(manifest.get("b").unwrap().transcript().len(), 30);
        assert_eq!(manifest.get("a").unwrap().transcript, "already here");

        assert_eq!(fx.pipeline.transcribe_pending().await.unwrap(), 0);
        assert_eq!(fx.transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_embed_index_and_ask() {
        let fx = fixture(vec![episode("b", "")]);
        fx.pipeline.transcribe_pending().await.unwrap();

        let summary = fx.pipeline.embed_all().await.unwrap();
        // 30 words, window 10: steps at 0 and 10, forward window only at 0.
        assert_eq!(summary.built, 1);
        assert_eq!(summary.embedded, 3);

        let again = fx.pipeline.embed_all().await.unwrap();
        assert_eq!(again.skipped, 1);
        assert_eq!(again.built, 0);

        let indexed = fx.pipeline.index_all().await.unwrap();
        assert_eq!(indexed, IndexSummary { episodes: 1, documents: 3 });
        assert_eq!(fx.index.len().await, 3);

        let response = fx.pipeline.ask("what about the rack?").await.unwrap();
        assert_eq!(response.sources.len(), 2);
        assert!(response.sources[0].starts_with("Episode b - "));
        // system + 2 hits + neighbors + user
        let expected = 2 + response.embeddings.len();
        assert_eq!(response.answer, format!("{} messages", expected));
    }

    #[tokio::test]
    async fn test_index_requires_artifacts() {
        let fx = fixture(vec![episode("a", "some words here")]);

        let err = fx.pipeline.index_all().await.unwrap_err();
        assert!(matches!(err, PodsearchError::Artifact { .. }));
        assert!(err.to_string().contains("episode a"));
    }

    #[tokio::test]
    async fn test_untranscribed_episodes_are_not_embedded() {
        let fx = fixture(vec![episode("a", "")]);

        let summary = fx.pipeline.embed_all().await.unwrap();
        assert_eq!(summary.untranscribed, 1);
        assert!(!fx.pipeline.artifacts().exists("a"));
    }
}
