//! Configuration
//!
//! Layered configuration for workspace layout, LLM provider and logging. Sources are
//! merged by [`merge::service::MergeService`] through the `config` crate.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod workspace;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::layout::WorkspaceConfig;

use crate::llm::LlmConfig;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentryConfig {
    /// Directory names of the current and legacy layouts
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Default LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
