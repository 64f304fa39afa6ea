//! Error types for resolution, discovery and component execution.

use crate::types::ComponentKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the path resolver and the component registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Neither the current nor the legacy layout contains the location
    #[error(
        "{kind} '{name}' not found (current layout: {}, legacy layout: {})",
        .current.display(),
        .legacy.display()
    )]
    NotFound {
        kind: ComponentKind,
        name: String,
        current: PathBuf,
        legacy: PathBuf,
    },

    /// Lookup of a name the registry does not hold
    #[error("{kind} '{key}' is not registered ({state})")]
    NotRegistered {
        kind: ComponentKind,
        key: String,
        state: DiscoveryState,
    },

    #[error("Invalid component name: {0}")]
    InvalidName(String),

    #[error("Invalid definition {}: {message}", .path.display())]
    Definition { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    AgentExecution(#[from] AgentExecutionError),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Registry state at the time of a failed lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    NotRun,
    Discovered,
}

impl fmt::Display for DiscoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryState::NotRun => f.write_str("discovery has not run"),
            DiscoveryState::Discovered => f.write_str("absent after discovery"),
        }
    }
}

/// Whether a failed execution is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transient LLM, network or timeout failure
    Retryable,
    /// Malformed input or configuration
    NonRetryable,
}

/// Failure of an agent or team `execute` call
#[derive(Debug, Error)]
#[error("agent {agent} failed: {message}")]
pub struct AgentExecutionError {
    pub agent: String,
    pub kind: FailureKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl AgentExecutionError {
    pub fn new(agent: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn malformed_input(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(agent, FailureKind::NonRetryable, message)
    }

    pub fn configuration(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(agent, FailureKind::NonRetryable, message)
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == FailureKind::Retryable
    }
}

/// Failure of a tool `invoke` call
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid tool input: {0}")]
    InvalidInput(String),

    #[error("tool {tool} failed: {message}")]
    Failed {
        tool: String,
        message: String,
        retryable: bool,
    },
}

impl ToolError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ToolError::Failed { retryable: true, .. })
    }
}
