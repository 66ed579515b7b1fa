//! Question answering over retrieved podcast context.

use super::{assemble_conversation, Generator};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::retrieval::{RetrievalResult, Retriever};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// RAG engine for question answering.
pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl RagEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: Retriever,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder,
            retriever,
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Embed the question and run both retrieval stages.
    pub async fn retrieve(&self, question: &str) -> Result<RetrievalResult> {
        let query_vector = self.embedder.embed(question).await?;
        self.retriever.retrieve(&query_vector).await
    }

    /// Ask a single question and get a grounded answer.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        let started = Instant::now();
        info!("Processing question");

        let retrieval = self.retrieve(question).await?;
        let documents = retrieval.combined();

        if documents.is_empty() {
            debug!("No context retrieved, generating without grounding");
        }
        let messages = assemble_conversation(&self.prompts.rag.system, &documents, question);
        let answer = self.generator.generate(&messages).await?;

        let response = RagResponse {
            question: question.to_string(),
            answer,
            sources: retrieval.hits.iter().map(|d| d.source_label()).collect(),
            embeddings: documents.iter().map(|d| d.key.to_string()).collect(),
            elapsed: started.elapsed(),
        };
        debug!(
            "Answered with {} context documents in {:?}",
            response.embeddings.len(),
            response.elapsed
        );
        Ok(response)
    }
}

/// A RAG response with answer and provenance.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The question as asked.
    pub question: String,
    /// The generated answer.
    pub answer: String,
    /// `"<title> - <link>"` of each vector search hit.
    pub sources: Vec<String>,
    /// Composite keys of every document placed in the conversation.
    pub embeddings: Vec<String>,
    pub elapsed: Duration,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!("\n{}", source));
            }
        }

        output
    }
}
