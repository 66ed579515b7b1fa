//! OpenSearch-backed search index.
//!
//! Talks to the cluster's REST API directly: documents are written with
//! `PUT /<index>/_doc/<key>` and queried with `POST /<index>/_search` using
//! either a `knn` or a `terms` on `_id` query. Any non-2xx answer is an error;
//! nothing is retried.

use super::{DocumentKey, IndexDocument, IndexHit, SearchIndex, VECTOR_FIELD};
use crate::config::IndexSettings;
use crate::error::{PodsearchError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// OpenSearch index client.
pub struct OpenSearchIndex {
    client: Client,
    base_url: Url,
    index_name: String,
    username: Option<String>,
    password: Option<String>,
}

impl OpenSearchIndex {
    /// Create a client from index settings.
    pub fn new(settings: &IndexSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()?;

        let base_url = Url::parse(&settings.url)?;
        if base_url.cannot_be_a_base() {
            return Err(PodsearchError::Config(format!(
                "Index URL cannot be used as a base: {}",
                settings.url
            )));
        }

        Ok(Self {
            client,
            base_url,
            index_name: settings.index_name.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(&self.index_name).extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| PodsearchError::Index(format!("{} failed: {}", action, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(PodsearchError::Index(format!(
                "unexpected response to {} ({}): {}",
                action, status, body
            )));
        }

        Ok(response)
    }

    async fn search(&self, body: &SearchRequest<'_>, action: &str) -> Result<Vec<IndexHit>> {
        let request = self.client.post(self.endpoint(&["_search"])).json(body);
        let response = self.send(request, action).await?;

        let text = response
            .text()
            .await
            .map_err(|e| PodsearchError::Index(format!("failed to read {} response: {}", action, e)))?;
        let parsed: SearchResponse = serde_json::from_str(&text).map_err(|e| {
            PodsearchError::Index(format!("failed to deserialize {} results: {}", action, e))
        })?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| IndexHit {
                id: hit.id,
                score: hit.score,
                document: hit.source,
            })
            .collect())
    }
}

#[async_trait]
impl SearchIndex for OpenSearchIndex {
    #[instrument(skip(self), fields(index = %self.index_name))]
    async fn ensure_index(&self, dimensions: usize) -> Result<()> {
        let url = self.endpoint(&[]);
        let response = self
            .authorized(self.client.head(url.clone()))
            .send()
            .await
            .map_err(|e| PodsearchError::Index(format!("index lookup failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                debug!("Index already exists");
                return Ok(());
            }
            StatusCode::NOT_FOUND => {}
            status => {
                return Err(PodsearchError::Index(format!(
                    "unexpected response to index lookup ({})",
                    status
                )));
            }
        }

        let body = serde_json::json!({
            "settings": { "index": { "knn": true } },
            "mappings": {
                "properties": {
                    VECTOR_FIELD: { "type": "knn_vector", "dimension": dimensions }
                }
            }
        });
        self.send(self.client.put(url).json(&body), "index creation").await?;
        info!("Created index with {} dimensional vectors", dimensions);
        Ok(())
    }

    #[instrument(skip(self, doc), fields(key = %key))]
    async fn upsert(&self, key: &DocumentKey, doc: &IndexDocument) -> Result<()> {
        let key = key.to_string();
        let request = self.client.put(self.endpoint(&["_doc", &key])).json(doc);
        self.send(request, &format!("indexing {}", key)).await?;
        Ok(())
    }

    #[instrument(skip(self, vector), fields(dims = vector.len()))]
    async fn knn_search(&self, vector: &[f32], size: usize, k: usize) -> Result<Vec<IndexHit>> {
        let body = SearchRequest {
            size,
            query: Query::Knn(KnnQuery {
                vector_data: KnnVector { vector, k },
            }),
        };
        let hits = self.search(&body, "vector query").await?;
        debug!("Vector query returned {} hits", hits.len());
        Ok(hits)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn fetch_by_ids(&self, ids: &[String], size: usize) -> Result<Vec<IndexHit>> {
        let body = SearchRequest {
            size,
            query: Query::Terms(TermsQuery { ids }),
        };
        self.search(&body, "id query").await
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    size: usize,
    query: Query<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Query<'a> {
    Knn(KnnQuery<'a>),
    Terms(TermsQuery<'a>),
}

#[derive(Serialize)]
struct KnnQuery<'a> {
    #[serde(rename = "vectorData")]
    vector_data: KnnVector<'a>,
}

#[derive(Serialize)]
struct KnnVector<'a> {
    vector: &'a [f32],
    k: usize,
}

#[derive(Serialize)]
struct TermsQuery<'a> {
    #[serde(rename = "_id")]
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: IndexDocument,
}
