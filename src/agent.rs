//! Agents
//!
//! The agent contract, the dependencies injected at construction, prompt loading
//! and the builtin prompted agent.

pub mod contract;
pub mod prompt;
pub mod prompted;
pub mod sink;

pub use contract::{Agent, AgentContext, AgentDefaults, AgentOptions};
pub use prompt::{render_template, resolve_prompt_path, PromptCache, PromptError, PromptLoader};
pub use prompted::{parse_response, strip_code_fences, PromptedAgent, PROMPTED_AGENT_FACTORY};
pub use sink::{CallbackSink, LogLevel, LogRecord, LogSink, TracingSink};
