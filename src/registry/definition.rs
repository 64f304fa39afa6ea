//! Component definition files.
//!
//! A directory becomes a component when it holds the canonical definition file
//! for its kind. The file names the factory that builds the component and carries
//! the component's static configuration.

use crate::error::RegistryError;
use crate::paths::layout::is_valid_component_name;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub const AGENT_DEFINITION_FILE: &str = "agent.toml";
pub const TOOL_DEFINITION_FILE: &str = "tool.toml";
pub const TEAM_DEFINITION_FILE: &str = "team.toml";

/// Factory used for teams whose definition does not name one
pub const DEFAULT_TEAM_FACTORY: &str = "sequential";

/// Per-agent overrides of the LLM defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentLlmOverrides {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Contents of `agent.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Catalog key; the directory name when unset
    #[serde(default)]
    pub factory: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Prompt template file, relative to the agent directory
    #[serde(default)]
    pub prompt: Option<String>,

    /// Inline system prompt
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Keys that must be present in the `execute` input
    #[serde(default)]
    pub required_inputs: Vec<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default)]
    pub llm: AgentLlmOverrides,
}

impl AgentDefinition {
    pub fn factory_key<'a>(&'a self, dir_name: &'a str) -> &'a str {
        self.factory.as_deref().unwrap_or(dir_name)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_factory(self.factory.as_deref())?;

        if let Some(ref prompt) = self.prompt {
            if prompt.trim().is_empty() {
                return Err("prompt cannot be empty if provided".to_string());
            }
        }
        if let Some(ref system_prompt) = self.system_prompt {
            if system_prompt.trim().is_empty() {
                return Err("system_prompt cannot be empty if provided".to_string());
            }
        }

        let mut seen = HashSet::new();
        for input in &self.required_inputs {
            if input.trim().is_empty() {
                return Err("required_inputs cannot contain empty names".to_string());
            }
            if !seen.insert(input.as_str()) {
                return Err(format!("required input '{}' is listed twice", input));
            }
        }

        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "llm.temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }
        if let Some(ref model) = self.llm.model {
            if model.trim().is_empty() {
                return Err("llm.model cannot be empty if provided".to_string());
            }
        }
        Ok(())
    }
}

/// Contents of `tool.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(default)]
    pub factory: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Free-form settings handed to the tool factory
    #[serde(default)]
    pub config: toml::Table,
}

impl ToolDefinition {
    pub fn factory_key<'a>(&'a self, dir_name: &'a str) -> &'a str {
        self.factory.as_deref().unwrap_or(dir_name)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_factory(self.factory.as_deref())
    }
}

/// Contents of the optional `team.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamDefinition {
    #[serde(default)]
    pub factory: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Member agents in execution order; all discovered agents when empty
    #[serde(default)]
    pub agents: Vec<String>,
}

impl TeamDefinition {
    pub fn factory_key(&self) -> &str {
        self.factory.as_deref().unwrap_or(DEFAULT_TEAM_FACTORY)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_factory(self.factory.as_deref())?;
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if !is_valid_component_name(agent) {
                return Err(format!("invalid agent name '{}' in agents", agent));
            }
            if !seen.insert(agent.as_str()) {
                return Err(format!("agent '{}' is listed twice", agent));
            }
        }
        Ok(())
    }
}

fn validate_factory(factory: Option<&str>) -> Result<(), String> {
    match factory {
        Some(f) if f.trim().is_empty() => Err("factory cannot be empty if provided".to_string()),
        _ => Ok(()),
    }
}

/// Parse a definition file.
pub fn load_definition<T: DeserializeOwned>(path: &Path) -> Result<T, RegistryError> {
    let content = std::fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
    toml::from_str(&content).map_err(|e| RegistryError::Definition {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn load_agent_definition(path: &Path) -> Result<AgentDefinition, RegistryError> {
    let definition: AgentDefinition = load_definition(path)?;
    definition.validate().map_err(|message| RegistryError::Definition {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(definition)
}

pub fn load_tool_definition(path: &Path) -> Result<ToolDefinition, RegistryError> {
    let definition: ToolDefinition = load_definition(path)?;
    definition.validate().map_err(|message| RegistryError::Definition {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(definition)
}

/// Load `team.toml` when present; a team directory without one gets the defaults.
pub fn load_team_definition(path: &Path) -> Result<TeamDefinition, RegistryError> {
    if !path.is_file() {
        return Ok(TeamDefinition::default());
    }
    let definition: TeamDefinition = load_definition(path)?;
    definition.validate().map_err(|message| RegistryError::Definition {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(definition)
}
