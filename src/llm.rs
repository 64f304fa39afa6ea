//! LLM client abstraction.
//!
//! Agents receive an [`LlmClient`] by injection. The default clients talk to an
//! OpenAI-compatible chat completions endpoint or to Gemini `generateContent`;
//! anything implementing the trait can stand in for them.

pub mod config;
pub mod gemini;
pub mod openai;

pub use config::{LlmConfig, ProviderType, ResolvedLlmSettings};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use crate::usage::TokenUsage;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Per-call options. Unset fields fall back to the client's configured defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub system: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Text returned by a completion plus whatever usage the provider reported
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Completion capability consumed by agents
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError>;

    /// Default model identifier
    fn model_name(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode LLM response: {0}")]
    Decode(String),

    #[error("LLM provider not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// Timeouts, transport failures, rate limiting and server errors are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Timeout(_) | LlmError::Transport(_) => true,
            LlmError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            LlmError::Decode(_) | LlmError::NotConfigured(_) => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else if err.is_decode() {
            LlmError::Decode(err.to_string())
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

/// Build the default client for the configured provider.
pub fn build_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let settings = config.resolve()?;
    let client: Arc<dyn LlmClient> = match settings.provider {
        ProviderType::OpenAI => Arc::new(OpenAiClient::new(&settings)?),
        ProviderType::Gemini => Arc::new(GeminiClient::new(&settings)?),
    };
    tracing::debug!(
        provider = %settings.provider,
        model = %settings.model,
        timeout_secs = settings.timeout.as_secs(),
        "Built default LLM client"
    );
    Ok(client)
}

/// Status and body of a non-success response.
pub(crate) async fn status_error(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    LlmError::Status {
        status,
        body: body.chars().take(512).collect(),
    }
}
