//! Chat completion collaborator.

use super::{ChatMessage, Role};
use crate::config::GenerationSettings;
use crate::error::{PodsearchError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Trait for answer generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a conversation, returning the model's reply.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Identifier of the model producing answers.
    fn model(&self) -> &str;
}

/// OpenAI chat completion generator.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    settings: GenerationSettings,
}

impl OpenAIGenerator {
    pub fn new(settings: GenerationSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            settings,
        })
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let err = |e: async_openai::error::OpenAIError| PodsearchError::Generation(e.to_string());
    let content = message.content.clone();

    Ok(match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(err)?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(err)?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(err)?
            .into(),
    })
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, messages), fields(model = %self.settings.model, messages = messages.len()))]
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .messages(messages)
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .build()
            .map_err(|e| PodsearchError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PodsearchError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| PodsearchError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}
