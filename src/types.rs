//! Core identifiers shared by the resolver, the registry and the component contracts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a discoverable component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Agent,
    Tool,
    Team,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Agent => "agent",
            ComponentKind::Tool => "tool",
            ComponentKind::Team => "team",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a component within a workspace: `(kind, team, name)`.
///
/// For teams `name` equals `team`. The display form (`team.name`, or just
/// `team` for teams) doubles as the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentName {
    kind: ComponentKind,
    team: String,
    name: String,
}

impl ComponentName {
    pub fn agent(team: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Agent,
            team: team.into(),
            name: name.into(),
        }
    }

    pub fn tool(team: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Tool,
            team: team.into(),
            name: name.into(),
        }
    }

    pub fn team(team: impl Into<String>) -> Self {
        let team = team.into();
        Self {
            kind: ComponentKind::Team,
            name: team.clone(),
            team,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn team_name(&self) -> &str {
        &self.team
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry key, `team.name` for agents and tools, `team` for teams.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ComponentKind::Team => write!(f, "{}", self.team),
            _ => write!(f, "{}.{}", self.team, self.name),
        }
    }
}
