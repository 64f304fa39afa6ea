//! Gemini `generateContent` client.

use super::{status_error, Completion, CompletionOptions, LlmClient, LlmError, ResolvedLlmSettings};
use crate::usage::extract_usage;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(settings: &ResolvedLlmSettings) -> Result<Self, LlmError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            LlmError::NotConfigured(
                "Gemini API key required (set llm.api_key, GEMINI_API_KEY or GOOGLE_API_KEY)"
                    .to_string(),
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
        let mut generation = json!({
            "temperature": options.temperature.unwrap_or(self.temperature),
        });
        if let Some(max_tokens) = options.max_tokens.or(self.max_tokens) {
            generation["maxOutputTokens"] = json!(max_tokens);
        }

        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": generation,
        });
        if let Some(system) = &options.system {
            body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }
        body
    }
}

/// Concatenated text parts of the first candidate plus reported usage.
pub(crate) fn parse_generate_response(body: &Value) -> Result<Completion, LlmError> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            LlmError::Decode("response has no candidates[0].content.parts".to_string())
        })?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    Ok(Completion {
        text,
        usage: extract_usage(body),
    })
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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
        parse_generate_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
