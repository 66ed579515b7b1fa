//! Builds embedding artifacts from transcripts.

use super::{ArtifactStore, EmbeddedChunk, FailurePolicy};
use crate::chunking::{Chunk, Transcript, WindowChunker};
use crate::embedding::Embedder;
use crate::error::{PodsearchError, Result};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of building one episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// An artifact already existed; nothing was embedded.
    Skipped,
    /// A new artifact was written.
    Built {
        path: PathBuf,
        embedded: usize,
        failed: usize,
    },
}

/// Chunks transcripts, embeds every chunk, and persists the result.
pub struct EmbeddingBuilder {
    embedder: Arc<dyn Embedder>,
    store: ArtifactStore,
    chunker: WindowChunker,
    policy: FailurePolicy,
    max_concurrent: usize,
}

impl EmbeddingBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, store: ArtifactStore, chunker: WindowChunker) -> Self {
        Self {
            embedder,
            store,
            chunker,
            policy: FailurePolicy::default(),
            max_concurrent: 1,
        }
    }

    /// Set the per-chunk failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Allow up to `max_concurrent` embedding calls in flight.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// The artifact store this builder writes to.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Embed one episode unless its artifact already exists.
    #[instrument(skip(self, transcript), fields(episode = %transcript.episode_id, words = transcript.len()))]
    pub async fn build_episode(&self, transcript: &Transcript) -> Result<BuildOutcome> {
        let episode_id = &transcript.episode_id;

        if self.store.exists(episode_id) {
            info!("Embeddings already exist, skipping");
            return Ok(BuildOutcome::Skipped);
        }

        let chunks: Vec<Chunk> = self.chunker.chunk(transcript);
        info!(
            "Embedding {} windows of {} words",
            chunks.len(),
            self.chunker.window_size()
        );

        let embedder = self.embedder.as_ref();
        let window_size = self.chunker.window_size();

        // `buffered` yields in submission order, so positions stay ascending.
        let mut results = stream::iter(chunks)
            .map(|chunk| async move {
                let result = embed_chunk(embedder, &chunk.content).await;
                (chunk, result)
            })
            .buffered(self.max_concurrent);

        let mut embedded = Vec::new();
        let mut failed = 0;

        while let Some((chunk, result)) = results.next().await {
            match result {
                Ok(vector) => {
                    embedded.push(EmbeddedChunk::new(chunk, vector, embedder.model(), window_size));
                }
                Err(e) => match self.policy {
                    FailurePolicy::FailFast => {
                        return Err(PodsearchError::Embedding(format!(
                            "chunk {} (words {}..{}) of episode {}: {}",
                            chunk.position, chunk.start_word, chunk.end_word, episode_id, e
                        )));
                    }
                    FailurePolicy::BestEffort => {
                        warn!(
                            position = chunk.position,
                            "Failed to embed words {}..{}, omitting chunk: {}",
                            chunk.start_word,
                            chunk.end_word,
                            e
                        );
                        failed += 1;
                    }
                },
            }
        }

        let path = self.store.save(episode_id, &embedded)?;
        info!("Stored {} embeddings ({} failed)", embedded.len(), failed);

        Ok(BuildOutcome::Built {
            path,
            embedded: embedded.len(),
            failed,
        })
    }
}

async fn embed_chunk(embedder: &dyn Embedder, content: &str) -> Result<Vec<f32>> {
    let vector = embedder.embed(content).await?;
    if vector.len() != embedder.dimensions() {
        return Err(PodsearchError::Embedding(format!(
            "expected {} dimensions, got {}",
            embedder.dimensions(),
            vector.len()
        )));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds by word count; fails for chunks whose first word is listed.
    struct StubEmbedder {
        calls: AtomicUsize,
        failing: HashSet<String>,
        dimensions: usize,
    }

    impl StubEmbedder {
        fn new(failing: &[&str]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing: failing.iter().map(|s| s.to_string()).collect(),
                dimensions: 2,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let first = text.split_whitespace().next().unwrap_or_default();
            if self.failing.contains(first) {
                return Err(PodsearchError::OpenAI("quota exceeded".to_string()));
            }
            Ok(vec![text.split_whitespace().count() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn transcript(words: usize) -> Transcript {
        Transcript::new("ep", (0..words).map(|i| format!("w{}", i)).collect())
    }

    fn builder(embedder: Arc<StubEmbedder>, dir: &std::path::Path) -> EmbeddingBuilder {
        EmbeddingBuilder::new(
            embedder,
            ArtifactStore::new(dir),
            WindowChunker::new(10).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_build_writes_every_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(StubEmbedder::new(&[]));
        let builder = builder(embedder.clone(), dir.path());

        let outcome = builder.build_episode(&transcript(60)).await.unwrap();
        let expected = WindowChunker::new(10).unwrap().chunk(&transcript(60)).len();

        match outcome {
            BuildOutcome::Built { embedded, failed, .. } => {
                assert_eq!(embedded, expected);
                assert_eq!(failed, 0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(embedder.calls(), expected);

        let stored = builder.store().load("ep").unwrap();
        let positions: Vec<usize> = stored.iter().map(|c| c.position).collect();
        assert_eq!(positions, (0..expected).collect::<Vec<_>>());
        assert!(stored.iter().all(|c| c.model == "stub-model" && c.window_size == 10));
    }

    #[tokio::test]
    async fn test_rebuild_is_skipped_without_embedding_calls() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(StubEmbedder::new(&[]));
        let builder = builder(embedder.clone(), dir.path());

        builder.build_episode(&transcript(60)).await.unwrap();
        let first_calls = embedder.calls();

        let outcome = builder.build_episode(&transcript(60)).await.unwrap();
        assert_eq!(outcome, BuildOutcome::Skipped);
        assert_eq!(embedder.calls(), first_calls);
    }

    #[tokio::test]
    async fn test_best_effort_omits_failed_chunks() {
        let dir = tempfile::tempdir().unwrap();
        // w10 opens the primary window at position 2 (words 10..20).
        let embedder = Arc::new(StubEmbedder::new(&["w10"]));
        let builder = builder(embedder, dir.path());

        let outcome = builder.build_episode(&transcript(60)).await.unwrap();
        let BuildOutcome::Built { failed, .. } = outcome else {
            panic!("expected a build");
        };
        assert_eq!(failed, 1);

        let positions: Vec<usize> = builder
            .store()
            .load("ep")
            .unwrap()
            .iter()
            .map(|c| c.position)
            .collect();
        assert!(!positions.contains(&2));
        assert!(positions.contains(&1));
        assert!(positions.contains(&3));
    }

    #[tokio::test]
    async fn test_fail_fast_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(StubEmbedder::new(&["w10"]));
        let builder = builder(embedder, dir.path()).with_policy(FailurePolicy::FailFast);

        let err = builder.build_episode(&transcript(60)).await.unwrap_err();
        assert!(matches!(err, PodsearchError::Embedding(_)));
        assert!(!builder.store().exists("ep"));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut stub = StubEmbedder::new(&[]);
        stub.dimensions = 3;
        let builder = builder(Arc::new(stub), dir.path());

        let outcome = builder.build_episode(&transcript(30)).await.unwrap();
        let BuildOutcome::Built { embedded, failed, .. } = outcome else {
            panic!("expected a build");
        };
        assert_eq!(embedded, 0);
        assert!(failed > 0);
    }

    #[tokio::test]
    async fn test_short_transcript_writes_empty_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(StubEmbedder::new(&[]));
        let builder = builder(embedder.clone(), dir.path());

        let outcome = builder.build_episode(&transcript(5)).await.unwrap();
        assert!(matches!(outcome, BuildOutcome::Built { embedded: 0, failed: 0, .. }));
        assert_eq!(embedder.calls(), 0);
        assert!(builder.store().load("ep").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_build_keeps_emission_order() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(StubEmbedder::new(&[]));
        let builder = builder(embedder, dir.path()).with_max_concurrent(4);

        builder.build_episode(&transcript(100)).await.unwrap();
        let positions: Vec<usize> = builder
            .store()
            .load("ep")
            .unwrap()
            .iter()
            .map(|c| c.position)
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }
}
