//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for the writing-assistant LLM.
//! It implements the `TextGenerationService` port from the `core` crate against
//! any OpenAI-compatible chat-completions endpoint (Gemini by default).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use documind_core::ports::{PortError, PortResult, TextGenerationService, TextStream};
use futures::StreamExt;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    system_instruction: String,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, system_instruction: String) -> Self {
        Self {
            client,
            model,
            system_instruction,
        }
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for OpenAiCompletionAdapter {
    /// Opens a streaming chat completion and yields the text deltas as they arrive.
    async fn stream_completion(&self, prompt: &str) -> PortResult<TextStream> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_instruction.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let upstream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        // Role-only and empty deltas carry no text for the caller.
        let fragments = upstream.filter_map(|chunk| async move {
            match chunk {
                Ok(response) => {
                    let text: String = response
                        .choices
                        .into_iter()
                        .filter_map(|choice| choice.delta.content)
                        .collect();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(PortError::Upstream(e.to_string()))),
            }
        });

        Ok(Box::pin(fragments))
    }
}
