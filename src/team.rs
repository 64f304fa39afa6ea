//! Team contract and the builtin sequential team.

use crate::agent::{Agent, LogLevel, LogRecord, LogSink};
use crate::error::AgentExecutionError;
use crate::paths::ComponentLocation;
use crate::registry::definition::TeamDefinition;
use crate::types::ComponentName;
use crate::usage::TokenUsage;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Catalog key of the builtin sequential team
pub const SEQUENTIAL_TEAM_FACTORY: &str = "sequential";

#[async_trait]
pub trait Team: Send {
    fn name(&self) -> &ComponentName;

    fn roster(&self) -> &TeamRoster;

    async fn execute(&mut self, input: Value) -> Result<Value, AgentExecutionError>;

    /// Combined usage of every member agent
    fn usage(&self) -> TokenUsage {
        self.roster().total_usage()
    }
}

/// Member agents of a team, in execution order.
#[derive(Default)]
pub struct TeamRoster {
    agents: Vec<Box<dyn Agent>>,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent; an agent with the same name is replaced in place.
    pub fn register_agent(&mut self, agent: Box<dyn Agent>) {
        match self
            .agents
            .iter()
            .position(|existing| existing.name() == agent.name())
        {
            Some(index) => self.agents[index] = agent,
            None => self.agents.push(agent),
        }
    }

    /// Look up a member by agent name (without the team prefix).
    pub fn get_agent_mut(&mut self, name: &str) -> Option<&mut (dyn Agent + 'static)> {
        self.agents
            .iter_mut()
            .find(|agent| agent.name().name() == name)
            .map(|agent| agent.as_mut())
    }

    pub fn list_agents(&self) -> Vec<&ComponentName> {
        self.agents.iter().map(|agent| agent.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn total_usage(&self) -> TokenUsage {
        self.agents.iter().map(|agent| agent.usage()).sum()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Agent>> {
        self.agents.iter_mut()
    }
}

/// Construction input for team factories
pub struct TeamContext {
    pub name: ComponentName,
    pub location: ComponentLocation,
    pub definition: Arc<TeamDefinition>,
    pub roster: TeamRoster,
    pub sink: Arc<dyn LogSink>,
}

/// Runs member agents one after another.
///
/// Each agent receives the team input extended with the outputs of the agents
/// that ran before it, keyed by agent name. The result maps every agent name to
/// its output. The first failure stops the run.
pub struct SequentialTeam {
    name: ComponentName,
    roster: TeamRoster,
    sink: Arc<dyn LogSink>,
}

impl SequentialTeam {
    pub fn new(ctx: TeamContext) -> Self {
        Self {
            name: ctx.name,
            roster: ctx.roster,
            sink: ctx.sink,
        }
    }
}

#[async_trait]
impl Team for SequentialTeam {
    fn name(&self) -> &ComponentName {
        &self.name
    }

    fn roster(&self) -> &TeamRoster {
        &self.roster
    }

    async fn execute(&mut self, input: Value) -> Result<Value, AgentExecutionError> {
        let team = self.name.key();
        let base = match input {
            Value::Object(map) => map,
            _ => {
                return Err(AgentExecutionError::malformed_input(
                    team,
                    "team input must be a JSON object",
                ))
            }
        };

        let mut outputs = Map::new();
        for agent in self.roster.iter_mut() {
            let agent_name = agent.name().name().to_string();
            let mut agent_input = base.clone();
            for (key, value) in &outputs {
                agent_input.insert(key.clone(), value.clone());
            }

            self.sink.log(&LogRecord::new(
                team.clone(),
                LogLevel::Info,
                format!("Running {}", agent_name),
            ));
            let output = agent.execute(Value::Object(agent_input)).await?;
            outputs.insert(agent_name, output);
        }

        tracing::info!(team = %self.name, agents = outputs.len(), "Team run complete");
        Ok(Value::Object(outputs))
    }
}
