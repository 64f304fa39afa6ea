//! Builtin `prompted` agent.
//!
//! Renders the agent's prompt template with the execute input, calls the LLM and
//! returns the response as JSON when it parses, as a string otherwise.

use crate::agent::contract::{Agent, AgentContext};
use crate::agent::prompt::{render_template, PromptLoader};
use crate::agent::sink::LogLevel;
use crate::error::{AgentExecutionError, RegistryError};
use crate::llm::CompletionOptions;
use crate::registry::definition::AGENT_DEFINITION_FILE;
use crate::types::ComponentName;
use crate::usage::TokenUsage;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Catalog key of the builtin prompted agent
pub const PROMPTED_AGENT_FACTORY: &str = "prompted";

pub struct PromptedAgent {
    ctx: AgentContext,
    prompts: PromptLoader,
}

impl PromptedAgent {
    pub fn new(ctx: AgentContext) -> Result<Self, RegistryError> {
        let definition = ctx.definition();
        if definition.prompt.is_none() && definition.system_prompt.is_none() {
            return Err(RegistryError::Definition {
                path: ctx.location().path().join(AGENT_DEFINITION_FILE),
                message: "prompted agent requires `prompt` or `system_prompt`".to_string(),
            });
        }
        let prompts = PromptLoader::new(
            ctx.location().path().to_path_buf(),
            Arc::clone(ctx.import_roots()),
        );
        Ok(Self { ctx, prompts })
    }

    fn variables(
        &self,
        input: &Map<String, Value>,
    ) -> Result<Map<String, Value>, AgentExecutionError> {
        let agent = self.ctx.name().key();
        for key in &self.ctx.definition().required_inputs {
            if !input.contains_key(key) {
                return Err(AgentExecutionError::malformed_input(
                    agent,
                    format!("missing required input '{}'", key),
                ));
            }
        }

        let mut variables = input.clone();
        for (key, value) in self.ctx.identifiers() {
            variables
                .entry(key.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }
        Ok(variables)
    }

    fn completion_options(&self, system: Option<String>) -> CompletionOptions {
        let llm = &self.ctx.definition().llm;
        CompletionOptions {
            system,
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }
}

#[async_trait]
impl Agent for PromptedAgent {
    fn name(&self) -> &ComponentName {
        self.ctx.name()
    }

    async fn execute(&mut self, input: Value) -> Result<Value, AgentExecutionError> {
        let agent = self.ctx.name().key();
        let input = match input {
            Value::Object(map) => map,
            other => {
                return Err(AgentExecutionError::malformed_input(
                    agent,
                    format!("input must be a JSON object, got {}", json_type(&other)),
                ))
            }
        };
        let variables = self.variables(&input)?;

        let render = |template: &str| {
            render_template(template, &variables).map_err(|e| {
                AgentExecutionError::malformed_input(agent.clone(), e.to_string()).with_source(e)
            })
        };

        let definition = self.ctx.definition().clone();
        let system = definition.system_prompt.as_deref().map(render).transpose()?;
        let prompt = match definition.prompt.as_deref() {
            Some(reference) => {
                let template = self.prompts.load(reference).map_err(|e| {
                    AgentExecutionError::configuration(agent.clone(), e.to_string()).with_source(e)
                })?;
                render(&template)?
            }
            None => serde_json::to_string_pretty(&Value::Object(input)).map_err(|e| {
                AgentExecutionError::malformed_input(agent.clone(), e.to_string()).with_source(e)
            })?,
        };

        self.ctx.log(LogLevel::Info, "Generating response");
        let options = self.completion_options(system);
        let completion = self.ctx.complete(&prompt, &options).await?;
        self.ctx.log(LogLevel::Success, "Response generated");

        Ok(parse_response(&completion.text))
    }

    fn usage(&self) -> TokenUsage {
        self.ctx.usage()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Remove a surrounding markdown code fence (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match body.find('\n') {
        Some(newline) if body[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &body[newline + 1..]
        }
        _ => body,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model response as JSON, falling back to the plain text.
pub fn parse_response(text: &str) -> Value {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).unwrap_or_else(|_| Value::String(cleaned.to_string()))
}
