//! Two-stage retrieval: vector search, then neighbor expansion.
//!
//! Stage 1 asks the index for the nearest stored chunks. Stage 2 derives the
//! keys of the chunks adjacent to every hit (by sequence position) and fetches
//! them in one batched id lookup, recovering context cut off at window edges.
//! Stage 2 results carry no ranking and may repeat Stage 1 hits unless
//! deduplication is enabled.

use crate::config::RetrievalSettings;
use crate::error::Result;
use crate::index::{DocumentKey, IndexDocument, IndexHit, SearchIndex};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A document returned by retrieval, annotated with its composite key.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub key: DocumentKey,
    /// Similarity score for vector hits; `None` for expanded neighbors.
    pub score: Option<f32>,
    pub document: IndexDocument,
}

impl RetrievedDocument {
    /// Chunk text.
    pub fn content(&self) -> &str {
        &self.document.transcript_chunk_text
    }

    /// Human-readable source, `"<title> - <link>"`.
    pub fn source_label(&self) -> String {
        format!("{} - {}", self.document.title, self.document.link)
    }
}

impl From<IndexHit> for RetrievedDocument {
    fn from(hit: IndexHit) -> Self {
        let key = hit.id.parse().unwrap_or_else(|_| {
            warn!("Hit id {} is not a composite key, using document fields", hit.id);
            hit.document.key()
        });
        Self {
            key,
            score: hit.score,
            document: hit.document,
        }
    }
}

/// Output of both retrieval stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    /// Stage 1 hits, most similar first.
    pub hits: Vec<RetrievedDocument>,
    /// Stage 2 neighbors, in index order.
    pub neighbors: Vec<RetrievedDocument>,
}

impl RetrievalResult {
    /// Hits followed by neighbors.
    pub fn combined(&self) -> Vec<RetrievedDocument> {
        self.hits.iter().chain(self.neighbors.iter()).cloned().collect()
    }

    /// Whether nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty() && self.neighbors.is_empty()
    }
}

/// Retrieves grounding context for a query vector.
pub struct Retriever {
    index: Arc<dyn SearchIndex>,
    settings: RetrievalSettings,
}

impl Retriever {
    pub fn new(index: Arc<dyn SearchIndex>, settings: RetrievalSettings) -> Self {
        Self { index, settings }
    }

    /// Stage 1: the nearest stored chunks, ranked by similarity.
    #[instrument(skip(self, query_vector))]
    pub async fn search(&self, query_vector: &[f32]) -> Result<Vec<RetrievedDocument>> {
        let hits = self
            .index
            .knn_search(query_vector, self.settings.search_size, self.settings.top_k)
            .await?;
        debug!("Vector search returned {} hits", hits.len());
        Ok(hits.into_iter().map(RetrievedDocument::from).collect())
    }

    /// Keys adjacent to each hit, in hit order.
    pub fn neighbor_keys(&self, hits: &[RetrievedDocument]) -> Vec<DocumentKey> {
        let derived = hits
            .iter()
            .flat_map(|hit| hit.key.neighbors(self.settings.neighbor_radius));

        if !self.settings.dedup_neighbors {
            return derived.collect();
        }

        let mut seen: HashSet<DocumentKey> = hits.iter().map(|h| h.key.clone()).collect();
        derived.filter(|key| seen.insert(key.clone())).collect()
    }

    /// Stage 2: fetch the neighbors of every hit in one batched lookup.
    #[instrument(skip(self, hits), fields(hits = hits.len()))]
    pub async fn expand_neighbors(&self, hits: &[RetrievedDocument]) -> Result<Vec<RetrievedDocument>> {
        let ids: Vec<String> = self
            .neighbor_keys(hits)
            .iter()
            .map(ToString::to_string)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let neighbors = self
            .index
            .fetch_by_ids(&ids, self.settings.max_neighbor_segments)
            .await?;
        debug!("Requested {} neighbor ids, found {}", ids.len(), neighbors.len());

        Ok(neighbors
            .into_iter()
            .map(|hit| RetrievedDocument {
                score: None,
                ..RetrievedDocument::from(hit)
            })
            .collect())
    }

    /// Run both stages.
    pub async fn retrieve(&self, query_vector: &[f32]) -> Result<RetrievalResult> {
        let hits = self.search(query_vector).await?;
        let neighbors = self.expand_neighbors(&hits).await?;
        Ok(RetrievalResult { hits, neighbors })
    }
}
