//! Chat Provider Client
//!
//! The seam between the relay and the hosted conversational model. The
//! production implementation speaks to any OpenAI-compatible chat endpoint;
//! Gemini is reached through its OpenAI compatibility layer.

use crate::session::{Role, Turn};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

/// Errors produced by a remote chat completion call.
#[derive(Debug, thiserror::Error)]
pub enum ChatProviderError {
    /// The request could not be built or the provider rejected it.
    #[error("chat provider request failed: {0}")]
    Request(#[from] OpenAIError),
    /// The provider answered, but the response carried no text.
    #[error("chat provider returned an empty reply")]
    EmptyReply,
}

/// A client that completes one conversational exchange against a remote model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Completes one turn given the fixed system instruction, the committed
    /// history (oldest first), and the new visitor utterance.
    ///
    /// Returns the assistant's reply text.
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[Turn],
        utterance: &str,
    ) -> Result<String, ChatProviderError>;
}

/// An implementation of `ChatClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The client configuration, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions
    ///   (e.g., "gemini-2.5-flash-lite").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAICompatibleClient {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[Turn],
        utterance: &str,
    ) -> Result<String, ChatProviderError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_instruction.to_owned())
                .build()?
                .into(),
        ];
        for turn in history {
            match turn.role {
                Role::Visitor => messages.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.text.clone())
                        .build()?
                        .into(),
                ),
                Role::Assistant => messages.push(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(turn.text.clone())
                        .build()?
                        .into(),
                ),
            }
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(utterance.to_owned())
                .build()?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()?;

        let response = self.client.chat().create(request).await?;
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.is_empty())
            .ok_or(ChatProviderError::EmptyReply)
    }
}
