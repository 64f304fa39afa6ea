//! Factory table binding definition files to compiled constructors.

use crate::agent::{Agent, AgentContext, PromptedAgent, PROMPTED_AGENT_FACTORY};
use crate::error::RegistryError;
use crate::team::{SequentialTeam, Team, TeamContext, SEQUENTIAL_TEAM_FACTORY};
use crate::tool::{Tool, ToolContext};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type AgentFactory =
    Arc<dyn Fn(AgentContext) -> Result<Box<dyn Agent>, RegistryError> + Send + Sync>;
pub type ToolFactory =
    Arc<dyn Fn(ToolContext) -> Result<Box<dyn Tool>, RegistryError> + Send + Sync>;
pub type TeamFactory =
    Arc<dyn Fn(TeamContext) -> Result<Box<dyn Team>, RegistryError> + Send + Sync>;

/// Constructors keyed by the `factory` field of definition files
#[derive(Clone, Default)]
pub struct ComponentCatalog {
    agents: HashMap<String, AgentFactory>,
    tools: HashMap<String, ToolFactory>,
    teams: HashMap<String, TeamFactory>,
}

impl ComponentCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the `prompted` agent and the `sequential` team.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.register_agent(PROMPTED_AGENT_FACTORY, |ctx| {
            Ok(Box::new(PromptedAgent::new(ctx)?) as Box<dyn Agent>)
        });
        catalog.register_team(SEQUENTIAL_TEAM_FACTORY, |ctx| {
            Ok(Box::new(SequentialTeam::new(ctx)) as Box<dyn Team>)
        });
        catalog
    }

    /// Register an agent factory, replacing any previous one under `key`.
    pub fn register_agent<F>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(AgentContext) -> Result<Box<dyn Agent>, RegistryError> + Send + Sync + 'static,
    {
        self.agents.insert(key.into(), Arc::new(factory));
        self
    }

    pub fn register_tool<F>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(ToolContext) -> Result<Box<dyn Tool>, RegistryError> + Send + Sync + 'static,
    {
        self.tools.insert(key.into(), Arc::new(factory));
        self
    }

    pub fn register_team<F>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(TeamContext) -> Result<Box<dyn Team>, RegistryError> + Send + Sync + 'static,
    {
        self.teams.insert(key.into(), Arc::new(factory));
        self
    }

    pub fn agent_factory(&self, key: &str) -> Option<AgentFactory> {
        self.agents.get(key).cloned()
    }

    pub fn tool_factory(&self, key: &str) -> Option<ToolFactory> {
        self.tools.get(key).cloned()
    }

    pub fn team_factory(&self, key: &str) -> Option<TeamFactory> {
        self.teams.get(key).cloned()
    }

    /// Registered keys per kind, sorted: `(agents, tools, teams)`
    pub fn keys(&self) -> (Vec<String>, Vec<String>, Vec<String>) {
        fn sorted<V>(map: &HashMap<String, V>) -> Vec<String> {
            let mut keys: Vec<String> = map.keys().cloned().collect();
            keys.sort();
            keys
        }
        (sorted(&self.agents), sorted(&self.tools), sorted(&self.teams))
    }
}

impl fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (agents, tools, teams) = self.keys();
        f.debug_struct("ComponentCatalog")
            .field("agents", &agents)
            .field("tools", &tools)
            .field("teams", &teams)
            .finish()
    }
}
