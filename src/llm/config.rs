//! LLM provider configuration.
//!
//! Values from the `[llm]` config section win. Unset fields fall back to the
//! conventional environment variables, then to built-in defaults.

use super::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "gemini")]
    Gemini,
}

impl ProviderType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderType::OpenAI),
            "gemini" | "google" => Some(ProviderType::Gemini),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::OpenAI => f.write_str("openai"),
            ProviderType::Gemini => f.write_str("gemini"),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Option<ProviderType>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// API key; loaded from the provider's environment variable when unset
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL override, e.g. an OpenAI-compatible gateway
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Upper bound for a single completion request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            temperature: None,
            max_tokens: None,
            api_key: None,
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Fully resolved provider settings
#[derive(Debug, Clone)]
pub struct ResolvedLlmSettings {
    pub provider: ProviderType,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedLlmSettings, LlmError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with<F>(&self, env: F) -> Result<ResolvedLlmSettings, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let provider = match self.provider {
            Some(provider) => provider,
            None => match env("LLM_PROVIDER") {
                Some(value) => ProviderType::parse(&value).ok_or_else(|| {
                    LlmError::NotConfigured(format!(
                        "Unknown LLM_PROVIDER '{}' (expected 'openai' or 'gemini')",
                        value
                    ))
                })?,
                None => ProviderType::Gemini,
            },
        };

        let model = self.model.clone().unwrap_or_else(|| match provider {
            ProviderType::Gemini => {
                env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string())
            }
            ProviderType::OpenAI => {
                env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string())
            }
        });
        if model.trim().is_empty() {
            return Err(LlmError::NotConfigured("Model name cannot be empty".to_string()));
        }

        let temperature = match self.temperature {
            Some(t) => t,
            None => parse_env(&env, &["LLM_TEMPERATURE", "OPENAI_TEMPERATURE"])?.unwrap_or(0.0),
        };
        if !(0.0..=2.0).contains(&temperature) {
            return Err(LlmError::NotConfigured(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                temperature
            )));
        }

        let max_tokens = match self.max_tokens {
            Some(m) => Some(m),
            None => parse_env(&env, &["LLM_MAX_TOKENS", "OPENAI_MAX_TOKENS"])?,
        };

        let api_key = self.api_key.clone().or_else(|| match provider {
            ProviderType::OpenAI => env("OPENAI_API_KEY"),
            ProviderType::Gemini => env("GEMINI_API_KEY").or_else(|| env("GOOGLE_API_KEY")),
        });

        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| match provider {
                ProviderType::OpenAI => DEFAULT_OPENAI_ENDPOINT.to_string(),
                ProviderType::Gemini => DEFAULT_GEMINI_ENDPOINT.to_string(),
            })
            .trim_end_matches('/')
            .to_string();

        if self.timeout_secs == 0 {
            return Err(LlmError::NotConfigured(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(ResolvedLlmSettings {
            provider,
            model,
            temperature,
            max_tokens,
            api_key,
            endpoint,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

fn parse_env<T, F>(env: &F, keys: &[&str]) -> Result<Option<T>, LlmError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = env(key) {
            return value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| LlmError::NotConfigured(format!("Invalid {}: '{}'", key, value)));
        }
    }
    Ok(None)
}
