//! OpenAI-compatible chat completions client.

use super::{status_error, Completion, CompletionOptions, LlmClient, LlmError, ResolvedLlmSettings};
use crate::usage::extract_usage;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(settings: &ResolvedLlmSettings) -> Result<Self, LlmError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            LlmError::NotConfigured(
                "OpenAI API key required (set llm.api_key or OPENAI_API_KEY)".to_string(),
            )
        })?;
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: settings.timeout,
        })
    }

    fn request_body(&self, prompt: &str, options: &CompletionOptions) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &options.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let mut body = json!({
            "model": options.model.as_deref().unwrap_or(&self.model),
            "messages": messages,
            "temperature": options.temperature.unwrap_or(self.temperature),
        });
        if let Some(max_tokens) = options.max_tokens.or(self.max_tokens) {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

/// Text of the first choice plus reported usage.
pub(crate) fn parse_chat_response(body: &Value) -> Result<Completion, LlmError> {
    let text = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::Decode("response has no choices[0].message.content".to_string()))?;
    Ok(Completion {
        text: text.to_string(),
        usage: extract_usage(body),
    })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, options))
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::from_reqwest(e, self.timeout))?;
        parse_chat_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
