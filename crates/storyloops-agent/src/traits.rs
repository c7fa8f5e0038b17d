use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::Generation;

/// Errors that can occur when calling the generation capability
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API key not configured (set OPENAI_API_KEY)")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Generator configuration error: {0}")]
    Config(String),
}

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Connection settings for a generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model name sent with every request
    pub model: String,
    /// Base URL of an OpenAI-compatible API
    pub api_base: String,
    /// Request timeout (None = client default)
    pub timeout: Option<Duration>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl GeneratorConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Sampling parameters for a single call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    /// None leaves the service default in place
    pub temperature: Option<f32>,
}

impl GenerationParams {
    pub const fn new(max_tokens: u32, temperature: Option<f32>) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }

    /// Writing or rewriting a story
    pub const fn story() -> Self {
        Self::new(1000, Some(0.7))
    }

    /// Free-form turns inside a co-created world
    pub const fn co_creation() -> Self {
        Self::new(400, Some(0.85))
    }

    /// Critic evaluation
    pub const fn judging() -> Self {
        Self::new(700, None)
    }

    /// Genre and lesson extraction
    pub const fn classification() -> Self {
        Self::new(400, Some(0.3))
    }
}

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::System => write!(f, "System"),
            ChatRole::User => write!(f, "User"),
            ChatRole::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One message of a chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The text-generation capability used by every role
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable name of the backend
    fn name(&self) -> &str;

    /// Generate text for a single user prompt
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, GenerationError> {
        self.chat(&[ChatMessage::user(prompt)], params).await
    }

    /// Generate the next assistant message for a chat transcript
    async fn chat(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<Generation, GenerationError>;
}
