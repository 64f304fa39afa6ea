//! Workspace builders and a scripted LLM client

use agentry::agent::{AgentDefaults, TracingSink};
use agentry::error::ToolError;
use agentry::llm::{Completion, CompletionOptions, LlmClient, LlmError};
use agentry::registry::{ComponentCatalog, ComponentRegistry};
use agentry::tool::{Tool, ToolContext};
use agentry::types::ComponentName;
use agentry::usage::TokenUsage;
use agentry::PathResolver;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const PROMPTED_AGENT: &str =
    "factory = \"prompted\"\nsystem_prompt = \"You are a helpful agent.\"\n";

pub fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn current_agent(root: &Path, team: &str, agent: &str, definition: &str) {
    write_file(
        &root.join("teams").join(team).join("agents").join(agent).join("agent.toml"),
        definition,
    );
}

pub fn current_tool(root: &Path, team: &str, tool: &str, definition: &str) {
    write_file(
        &root.join("teams").join(team).join("tools").join(tool).join("tool.toml"),
        definition,
    );
}

/// `team_dir` and `agent_dir` are legacy directory names, e.g. `Company Context Team`
pub fn legacy_agent(root: &Path, team_dir: &str, agent_dir: &str, definition: &str) {
    write_file(
        &root.join(team_dir).join(agent_dir).join("agent.toml"),
        definition,
    );
}

/// Registry with the builtin factories plus an `echo` tool
pub fn catalog() -> ComponentCatalog {
    let mut catalog = ComponentCatalog::with_builtins();
    catalog.register_tool("echo", |ctx| Ok(Box::new(EchoTool { ctx }) as Box<dyn Tool>));
    catalog
}

pub fn registry(root: &Path) -> ComponentRegistry {
    ComponentRegistry::new(PathResolver::new(root), catalog())
}

pub fn registry_with_llm(root: &Path, client: Arc<dyn LlmClient>) -> ComponentRegistry {
    ComponentRegistry::with_defaults(
        PathResolver::new(root),
        catalog(),
        AgentDefaults {
            llm: Some(client),
            sink: Arc::new(TracingSink),
        },
    )
}

pub struct EchoTool {
    ctx: ToolContext,
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &ComponentName {
        self.ctx.name()
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        Ok(input)
    }
}

/// Replays queued responses in order and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<Result<Completion, LlmError>>>,
    prompts: Mutex<Vec<(String, CompletionOptions)>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str, usage: TokenUsage) -> Self {
        self.responses.lock().push_back(Ok(Completion {
            text: text.to_string(),
            usage: Some(usage),
        }));
        self
    }

    pub fn fail(self, error: LlmError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<(String, CompletionOptions)> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        self.prompts.lock().push((prompt.to_string(), options.clone()));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::NotConfigured("script exhausted".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
