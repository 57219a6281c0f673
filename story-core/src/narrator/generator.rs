//! The generation capability.
//!
//! [`Generator`] is the seam between the narrator and whatever produces
//! text. [`ChatGenerator`] is the production implementation backed by an
//! OpenAI-compatible chat endpoint; tests use
//! [`ScriptedGenerator`](crate::testing::ScriptedGenerator).

use super::profile::InstructionProfile;
use async_trait::async_trait;
use chat::{Chat, FinishReason, Message, Request};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from a single generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Client(#[from] chat::Error),

    #[error("model returned an empty completion")]
    EmptyCompletion,

    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// Whether retrying the same call could help.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Client(e) => e.is_transient(),
            GenerationError::EmptyCompletion => true,
            GenerationError::Unavailable(_) => false,
        }
    }
}

/// Produces text for a user message under an instruction profile.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        profile: &InstructionProfile,
        message: &str,
    ) -> Result<String, GenerationError>;
}

/// Generator backed by a chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatGenerator {
    chat: Chat,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl ChatGenerator {
    pub fn new(chat: Chat) -> Self {
        Self {
            chat,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        self.chat.model()
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn generate(
        &self,
        profile: &InstructionProfile,
        message: &str,
    ) -> Result<String, GenerationError> {
        let mut request =
            Request::new(vec![Message::user(message)]).with_system(profile.instruction());

        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self.chat.complete(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                profile = %profile.kind(),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }
        if response.finish_reason == FinishReason::Length {
            warn!(profile = %profile.kind(), "completion was cut off by the token limit");
        }

        let text = response.content.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }
        Ok(text.to_string())
    }
}
