//! In-memory search index.
//!
//! Ranks by cosine similarity. Useful for testing and small archives.

use super::{cosine_similarity, DocumentKey, IndexDocument, IndexHit, SearchIndex};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// In-memory search index.
pub struct MemoryIndex {
    documents: RwLock<HashMap<String, IndexDocument>>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the index holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn ensure_index(&self, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, key: &DocumentKey, doc: &IndexDocument) -> Result<()> {
        let mut docs = self.documents.write().await;
        docs.insert(key.to_string(), doc.clone());
        Ok(())
    }

    async fn knn_search(&self, vector: &[f32], size: usize, k: usize) -> Result<Vec<IndexHit>> {
        let docs = self.documents.read().await;

        let mut results: Vec<IndexHit> = docs
            .iter()
            .map(|(id, doc)| IndexHit {
                id: id.clone(),
                score: Some(cosine_similarity(vector, &doc.vector_data)),
                document: doc.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(size.min(k));

        Ok(results)
    }

    async fn fetch_by_ids(&self, ids: &[String], size: usize) -> Result<Vec<IndexHit>> {
        let docs = self.documents.read().await;
        let mut seen = HashSet::new();

        // A terms query matches each document once, however often it is named.
        Ok(ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| {
                docs.get(id).map(|doc| IndexHit {
                    id: id.clone(),
                    score: None,
                    document: doc.clone(),
                })
            })
            .take(size)
            .collect())
    }
}
