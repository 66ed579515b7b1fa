//! Vector index abstraction for podsearch.
//!
//! Documents are stored under a composite key, `episode-<id>-embedding-<seq>`,
//! so that the neighbors of any hit can be addressed by id without a lookup
//! table.

mod memory;
mod opensearch;

pub use memory::MemoryIndex;
pub use opensearch::OpenSearchIndex;

use crate::error::{PodsearchError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KEY_PREFIX: &str = "episode-";
const KEY_SEPARATOR: &str = "-embedding-";

/// Name of the vector field in index documents.
pub const VECTOR_FIELD: &str = "vectorData";

/// Identity of one embedded chunk in the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub episode_id: String,
    pub position: usize,
}

impl DocumentKey {
    pub fn new(episode_id: impl Into<String>, position: usize) -> Self {
        Self {
            episode_id: episode_id.into(),
            position,
        }
    }

    /// Keys of the chunks within `radius` positions of this one.
    ///
    /// Ordered `p+1, p-1, p+2, p-2, ...`; positions below zero are omitted.
    pub fn neighbors(&self, radius: usize) -> Vec<DocumentKey> {
        let mut keys = Vec::with_capacity(radius * 2);
        for offset in 1..=radius {
            keys.push(DocumentKey::new(self.episode_id.clone(), self.position + offset));
            if let Some(prev) = self.position.checked_sub(offset) {
                keys.push(DocumentKey::new(self.episode_id.clone(), prev));
            }
        }
        keys
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", KEY_PREFIX, self.episode_id, KEY_SEPARATOR, self.position)
    }
}

impl FromStr for DocumentKey {
    type Err = PodsearchError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PodsearchError::InvalidInput(format!("Malformed document key: {}", s));

        let rest = s.strip_prefix(KEY_PREFIX).ok_or_else(invalid)?;
        let (episode_id, position) = rest.rsplit_once(KEY_SEPARATOR).ok_or_else(invalid)?;
        if episode_id.is_empty() {
            return Err(invalid());
        }
        let canonical = !position.is_empty()
            && position.bytes().all(|b| b.is_ascii_digit())
            && (position == "0" || !position.starts_with('0'));
        if !canonical {
            return Err(invalid());
        }
        let position = position.parse::<usize>().map_err(|_| invalid())?;

        Ok(DocumentKey::new(episode_id, position))
    }
}

/// A document as stored in the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexDocument {
    pub title: String,
    pub guid: String,
    pub published: String,
    pub link: String,
    pub description: String,
    /// The chunk's text.
    pub transcript_chunk_text: String,
    /// The chunk's sequence position.
    pub vector_id: usize,
    /// The chunk's embedding.
    pub vector_data: Vec<f32>,
}

impl IndexDocument {
    /// Key derived from the document's own fields.
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(self.guid.clone(), self.vector_id)
    }
}

/// A document returned by the index, with its id and score.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    /// Raw document id as stored.
    pub id: String,
    /// Similarity score, when the query was a vector search.
    pub score: Option<f32>,
    pub document: IndexDocument,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create the index with a vector mapping if it does not exist yet.
    async fn ensure_index(&self, dimensions: usize) -> Result<()>;

    /// Store a document under its composite key, replacing any previous version.
    async fn upsert(&self, key: &DocumentKey, doc: &IndexDocument) -> Result<()>;

    /// Nearest-neighbor search: `size` results at most, `k` neighbors requested.
    async fn knn_search(&self, vector: &[f32], size: usize, k: usize) -> Result<Vec<IndexHit>>;

    /// Fetch documents by id, at most `size` of them.
    async fn fetch_by_ids(&self, ids: &[String], size: usize) -> Result<Vec<IndexHit>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = DocumentKey::new("abc", 7);
        assert_eq!(key.to_string(), "episode-abc-embedding-7");
    }

    #[test]
    fn test_key_parse_roundtrip_with_hyphenated_guid() {
        let key: DocumentKey = "episode-5f1c-22aa-embedding-12".parse().unwrap();
        assert_eq!(key, DocumentKey::new("5f1c-22aa", 12));
        assert_eq!(key.to_string(), "episode-5f1c-22aa-embedding-12");
    }

    #[test]
    fn test_key_parse_rejects_malformed() {
        for bad in [
            "abc-embedding-1",
            "episode-abc-1",
            "episode--embedding-1",
            "episode-abc-embedding-",
            "episode-abc-embedding--1",
        ] {
            assert!(bad.parse::<DocumentKey>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_key_parse_requires_canonical_position() {
        for bad in ["episode-a-embedding-+5", "episode-a-embedding-05", "episode-a-embedding-00"] {
            assert!(bad.parse::<DocumentKey>().is_err(), "{}", bad);
        }
        let zero: DocumentKey = "episode-a-embedding-0".parse().unwrap();
        assert_eq!(zero, DocumentKey::new("a", 0));
        let ten: DocumentKey = "episode-a-embedding-10".parse().unwrap();
        assert_eq!(ten.to_string(), "episode-a-embedding-10");
    }

    #[test]
    fn test_neighbors_of_first_chunk() {
        let neighbors = DocumentKey::new("e", 0).neighbors(1);
        assert_eq!(neighbors, vec![DocumentKey::new("e", 1)]);
    }

    #[test]
    fn test_neighbors_of_interior_chunk() {
        let neighbors: Vec<String> = DocumentKey::new("e", 5)
            .neighbors(1)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(neighbors, vec!["episode-e-embedding-6", "episode-e-embedding-4"]);
    }

    #[test]
    fn test_neighbors_wider_radius() {
        let positions: Vec<usize> = DocumentKey::new("e", 1)
            .neighbors(3)
            .into_iter()
            .map(|k| k.position)
            .collect();
        assert_eq!(positions, vec![2, 0, 3, 4]);
    }

    #[test]
    fn test_document_field_names() {
        let doc = IndexDocument {
            guid: "g".to_string(),
            transcript_chunk_text: "words".to_string(),
            vector_id: 3,
            vector_data: vec![0.5],
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["transcriptChunkText"], "words");
        assert_eq!(json["vectorId"], 3);
        assert_eq!(json[VECTOR_FIELD][0], 0.5);
        assert_eq!(doc.key().to_string(), "episode-g-embedding-3");
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }
}
