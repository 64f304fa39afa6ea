//! Filesystem scans for the current and legacy layouts.
//!
//! Scans only find candidate directories; loading definitions and binding
//! factories happens in the registry.

use crate::paths::layout::{
    agent_name_from_legacy, is_valid_component_name, team_name_from_legacy, tool_name_from_legacy,
};
use crate::paths::resolver::child_dirs;
use crate::paths::{ComponentLocation, PathResolver};
use crate::registry::definition::{
    AGENT_DEFINITION_FILE, TEAM_DEFINITION_FILE, TOOL_DEFINITION_FILE,
};
use crate::types::ComponentName;
use std::path::PathBuf;
use tracing::debug;

/// A directory that looks like a component
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub name: ComponentName,
    pub location: ComponentLocation,
    /// Definition file; may not exist for teams
    pub definition: PathBuf,
}

#[derive(Debug, Default)]
pub(crate) struct ScanResult {
    pub teams: Vec<Candidate>,
    pub agents: Vec<Candidate>,
    pub tools: Vec<Candidate>,
}

/// Private (`_`) and hidden directories are ignored; so are names that cannot
/// form a registry key.
fn is_component_dir(name: &str) -> bool {
    !name.starts_with('_') && is_valid_component_name(name)
}

/// Scan `teams/*`, `teams/*/agents/*` and `teams/*/tools/*`.
pub(crate) fn scan_current(resolver: &PathResolver) -> ScanResult {
    let layout = resolver.layout();
    let mut result = ScanResult::default();

    for (team, team_dir) in child_dirs(&resolver.teams_root()) {
        if !is_component_dir(&team) {
            debug!(team, "Skipping team directory");
            continue;
        }

        for (agent, agent_dir) in child_dirs(&team_dir.join(&layout.agents_dir)) {
            let definition = agent_dir.join(AGENT_DEFINITION_FILE);
            if !definition.is_file() {
                continue;
            }
            if !is_component_dir(&agent) {
                debug!(team, agent, "Skipping agent directory");
                continue;
            }
            result.agents.push(Candidate {
                name: ComponentName::agent(&team, agent),
                location: ComponentLocation::current(agent_dir),
                definition,
            });
        }

        for (tool, tool_dir) in child_dirs(&team_dir.join(&layout.tools_dir)) {
            let definition = tool_dir.join(TOOL_DEFINITION_FILE);
            if !definition.is_file() {
                continue;
            }
            if !is_component_dir(&tool) {
                debug!(team, tool, "Skipping tool directory");
                continue;
            }
            result.tools.push(Candidate {
                name: ComponentName::tool(&team, tool),
                location: ComponentLocation::current(tool_dir),
                definition,
            });
        }

        result.teams.push(Candidate {
            name: ComponentName::team(&team),
            definition: team_dir.join(TEAM_DEFINITION_FILE),
            location: ComponentLocation::current(team_dir),
        });
    }
    result
}

/// Scan `{Name} Team/`, `{Name} Team/{Name}_Agent/` and `{Name}_Agent/tools/{name}/`.
pub(crate) fn scan_legacy(resolver: &PathResolver) -> ScanResult {
    let layout = resolver.layout();
    let mut result = ScanResult::default();

    for (dir_name, team_dir) in child_dirs(resolver.root()) {
        let Some(team) = team_name_from_legacy(&dir_name) else {
            continue;
        };

        for (agent_dir_name, agent_dir) in child_dirs(&team_dir) {
            let Some(agent) = agent_name_from_legacy(&agent_dir_name) else {
                continue;
            };

            for (tool_dir_name, tool_dir) in child_dirs(&agent_dir.join(&layout.tools_dir)) {
                let definition = tool_dir.join(TOOL_DEFINITION_FILE);
                let Some(tool) = tool_name_from_legacy(&tool_dir_name) else {
                    continue;
                };
                if !definition.is_file() {
                    continue;
                }
                result.tools.push(Candidate {
                    name: ComponentName::tool(&team, tool),
                    location: ComponentLocation::legacy(tool_dir),
                    definition,
                });
            }

            let definition = agent_dir.join(AGENT_DEFINITION_FILE);
            if definition.is_file() {
                result.agents.push(Candidate {
                    name: ComponentName::agent(&team, agent),
                    location: ComponentLocation::legacy(agent_dir),
                    definition,
                });
            }
        }

        result.teams.push(Candidate {
            name: ComponentName::team(&team),
            definition: team_dir.join(TEAM_DEFINITION_FILE),
            location: ComponentLocation::legacy(team_dir),
        });
    }
    result
}
