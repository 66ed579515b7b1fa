//! RAG (Retrieval-Augmented Generation) over the podcast archive.
//!
//! Retrieved chunks are turned into a conversation for a chat model: the
//! system prompt, one system message per chunk in the order received, then
//! the user's question. Nothing is truncated or reordered here.

mod engine;
mod generator;

pub use engine::{RagEngine, RagResponse};
pub use generator::{Generator, OpenAIGenerator};

use crate::retrieval::RetrievedDocument;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message sent to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Build the message sequence for one question.
pub fn assemble_conversation(
    system_prompt: &str,
    documents: &[RetrievedDocument],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(documents.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(documents.iter().map(|d| ChatMessage::system(d.content())));
    messages.push(ChatMessage::user(question));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DocumentKey, IndexDocument};

    fn retrieved(position: usize, text: &str) -> RetrievedDocument {
        RetrievedDocument {
            key: DocumentKey::new("ep", position),
            score: None,
            document: IndexDocument {
                guid: "ep".to_string(),
                vector_id: position,
                transcript_chunk_text: text.to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_conversation_layout() {
        let docs = vec![retrieved(5, "five"), retrieved(6, "six"), retrieved(6, "six")];
        let messages = assemble_conversation("be helpful", &docs, "what is a rack?");

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], ChatMessage::system("be helpful"));
        // Received order, duplicates kept.
        assert_eq!(messages[1].content, "five");
        assert_eq!(messages[2].content, "six");
        assert_eq!(messages[3].content, "six");
        assert!(messages[1..4].iter().all(|m| m.role == Role::System));
        assert_eq!(messages[4], ChatMessage::user("what is a rack?"));
    }

    #[test]
    fn test_conversation_without_context() {
        let messages = assemble_conversation("prompt", &[], "hello");
        assert_eq!(
            messages,
            vec![ChatMessage::system("prompt"), ChatMessage::user("hello")]
        );
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
