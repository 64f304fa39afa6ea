//! The agent contract: injected construction, one entry point, usage side channel.

use crate::agent::sink::{LogLevel, LogRecord, LogSink, TracingSink};
use crate::error::{AgentExecutionError, FailureKind};
use crate::llm::{build_client, Completion, CompletionOptions, LlmClient, LlmConfig};
use crate::paths::{ComponentLocation, ImportRoots};
use crate::registry::definition::AgentDefinition;
use crate::types::ComponentName;
use crate::usage::{TokenUsage, UsageTracker};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A constructed agent.
///
/// `execute` takes `&mut self`, so calls on one handle are serialised by the
/// borrow checker. Handles are owned by their caller and share no mutable state.
#[async_trait]
pub trait Agent: Send {
    fn name(&self) -> &ComponentName;

    /// Run the agent on a JSON input.
    async fn execute(&mut self, input: Value) -> Result<Value, AgentExecutionError>;

    /// Cumulative usage of this handle.
    fn usage(&self) -> TokenUsage;
}

/// Dependencies supplied by the caller at instantiation time.
#[derive(Clone, Default)]
pub struct AgentOptions {
    pub llm_client: Option<Arc<dyn LlmClient>>,
    /// Caller identifiers such as `company_id`
    pub identifiers: HashMap<String, String>,
    pub log_sink: Option<Arc<dyn LogSink>>,
}

impl AgentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_llm_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    pub fn with_identifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.insert(key.into(), value.into());
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }
}

/// Fallbacks for options the caller leaves unset
#[derive(Clone)]
pub struct AgentDefaults {
    pub llm: Option<Arc<dyn LlmClient>>,
    pub sink: Arc<dyn LogSink>,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            llm: None,
            sink: Arc::new(TracingSink),
        }
    }
}

impl AgentDefaults {
    /// Defaults with the provider client built from `config`.
    ///
    /// An unusable provider configuration leaves the client unset; agents that
    /// need one then fail at `execute` with a non-retryable error.
    pub fn from_llm_config(config: &LlmConfig) -> Self {
        let llm = match build_client(config) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::debug!(error = %e, "No default LLM client available");
                None
            }
        };
        Self {
            llm,
            ..Self::default()
        }
    }
}

/// Everything a factory needs to build an agent
pub struct AgentContext {
    name: ComponentName,
    location: ComponentLocation,
    definition: Arc<AgentDefinition>,
    identifiers: HashMap<String, String>,
    llm: Option<Arc<dyn LlmClient>>,
    sink: Arc<dyn LogSink>,
    import_roots: Arc<ImportRoots>,
    tracker: UsageTracker,
}

impl AgentContext {
    pub fn new(
        name: ComponentName,
        location: ComponentLocation,
        definition: Arc<AgentDefinition>,
        options: AgentOptions,
        defaults: &AgentDefaults,
        import_roots: Arc<ImportRoots>,
    ) -> Self {
        Self {
            name,
            location,
            definition,
            identifiers: options.identifiers,
            llm: options.llm_client.or_else(|| defaults.llm.clone()),
            sink: options
                .log_sink
                .unwrap_or_else(|| Arc::clone(&defaults.sink)),
            import_roots,
            tracker: UsageTracker::new(),
        }
    }

    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    pub fn location(&self) -> &ComponentLocation {
        &self.location
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn identifiers(&self) -> &HashMap<String, String> {
        &self.identifiers
    }

    pub fn identifier(&self, key: &str) -> Option<&str> {
        self.identifiers.get(key).map(String::as_str)
    }

    pub fn import_roots(&self) -> &Arc<ImportRoots> {
        &self.import_roots
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.sink
            .log(&LogRecord::new(self.name.key(), level, message));
    }

    /// Call the LLM and record its usage.
    ///
    /// Provider failures keep their retry classification; a missing client is a
    /// configuration error.
    pub async fn complete(
        &mut self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, AgentExecutionError> {
        let llm = self.llm.clone().ok_or_else(|| {
            AgentExecutionError::configuration(self.name.key(), "no LLM client configured")
        })?;

        match llm.complete(prompt, options).await {
            Ok(completion) => {
                self.tracker.record(completion.usage);
                tracing::debug!(
                    agent = %self.name,
                    model = llm.model_name(),
                    usage = ?completion.usage,
                    "LLM call completed"
                );
                Ok(completion)
            }
            Err(e) => {
                let kind = if e.is_retryable() {
                    FailureKind::Retryable
                } else {
                    FailureKind::NonRetryable
                };
                tracing::warn!(
                    agent = %self.name,
                    error = %e,
                    retryable = e.is_retryable(),
                    "LLM call failed"
                );
                Err(AgentExecutionError::new(self.name.key(), kind, e.to_string()).with_source(e))
            }
        }
    }

    pub fn usage(&self) -> TokenUsage {
        self.tracker.usage()
    }
}
