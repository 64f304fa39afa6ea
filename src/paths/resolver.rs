//! PathResolver: symbolic names to concrete locations.
//!
//! Single source of truth for workspace paths. Every resolution goes through the
//! [`BackwardCompatibilityShim`], so callers see one lookup key for both layouts.

use crate::compat::{BackwardCompatibilityShim, LegacyProbe};
use crate::config::WorkspaceConfig;
use crate::error::RegistryError;
use crate::paths::import_roots::ImportRoots;
use crate::paths::layout::{
    agent_name_from_legacy, is_valid_component_name, legacy_agent_dir_name, legacy_team_dir_name,
    legacy_tool_dir_name, team_name_from_legacy, tool_name_from_legacy, ComponentLocation,
};
use crate::types::ComponentKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Resolves teams, agents, tools, team utilities and shared resources under a workspace root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    layout: WorkspaceConfig,
}

impl PathResolver {
    /// Resolver over `root` with the default layout names
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_layout(root, WorkspaceConfig::default())
    }

    pub fn with_layout(root: impl Into<PathBuf>, layout: WorkspaceConfig) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &WorkspaceConfig {
        &self.layout
    }

    /// Root of the current layout, `{root}/teams`
    pub fn teams_root(&self) -> PathBuf {
        self.root.join(&self.layout.teams_dir)
    }

    pub fn current_team_path(&self, team: &str) -> PathBuf {
        self.teams_root().join(team)
    }

    pub fn current_agent_path(&self, team: &str, agent: &str) -> PathBuf {
        self.current_team_path(team)
            .join(&self.layout.agents_dir)
            .join(agent)
    }

    pub fn current_tool_path(&self, team: &str, tool: &str) -> PathBuf {
        self.current_team_path(team)
            .join(&self.layout.tools_dir)
            .join(tool)
    }

    pub fn legacy_team_path(&self, team: &str) -> PathBuf {
        self.root.join(legacy_team_dir_name(team))
    }

    /// Resolve a team directory.
    pub fn resolve_team_location(&self, team: &str) -> Result<ComponentLocation, RegistryError> {
        check_name(ComponentKind::Team, team)?;
        BackwardCompatibilityShim::resolve(
            ComponentKind::Team,
            team,
            self.current_team_path(team),
            || self.probe_legacy_team(team),
        )
    }

    /// Resolve an agent directory. The team must resolve first.
    pub fn resolve_agent_location(
        &self,
        team: &str,
        agent: &str,
    ) -> Result<ComponentLocation, RegistryError> {
        check_name(ComponentKind::Agent, agent)?;
        self.resolve_team_location(team)?;

        BackwardCompatibilityShim::resolve(
            ComponentKind::Agent,
            &format!("{}.{}", team, agent),
            self.current_agent_path(team, agent),
            || self.probe_legacy_agent(team, agent),
        )
    }

    /// Resolve a tool directory. The team must resolve first.
    pub fn resolve_tool_location(
        &self,
        team: &str,
        tool: &str,
    ) -> Result<ComponentLocation, RegistryError> {
        check_name(ComponentKind::Tool, tool)?;
        self.resolve_team_location(team)?;

        BackwardCompatibilityShim::resolve(
            ComponentKind::Tool,
            &format!("{}.{}", team, tool),
            self.current_tool_path(team, tool),
            || self.probe_legacy_tool(team, tool),
        )
    }

    /// Resolve the team-specific utilities directory.
    pub fn resolve_team_utils_location(
        &self,
        team: &str,
    ) -> Result<ComponentLocation, RegistryError> {
        check_name(ComponentKind::Team, team)?;
        BackwardCompatibilityShim::resolve(
            ComponentKind::Team,
            &format!("{}/{}", team, self.layout.utils_dir),
            self.current_team_path(team).join(&self.layout.utils_dir),
            || {
                let probe = self.probe_legacy_team(team);
                let base = probe.matched.unwrap_or(probe.expected);
                LegacyProbe::at(base.join(&self.layout.utils_dir))
            },
        )
    }

    /// Resolve a cross-team shared resource root such as `llms`.
    pub fn resolve_shared_location(
        &self,
        category: &str,
    ) -> Result<ComponentLocation, RegistryError> {
        if !is_valid_component_name(category) {
            return Err(RegistryError::InvalidName(format!(
                "shared category '{}'",
                category
            )));
        }
        BackwardCompatibilityShim::resolve(
            ComponentKind::Team,
            &format!("{}/{}", self.layout.shared_dir, category),
            self.root.join(&self.layout.shared_dir).join(category),
            || LegacyProbe::at(self.root.join(&self.layout.legacy_shared_dir).join(category)),
        )
    }

    /// Make a team's (and optionally an agent's) locations available for resource lookups.
    ///
    /// Registers, in increasing priority: the shared root, the team root, the team
    /// utilities and the agent directory. Missing optional directories are skipped.
    /// Safe to repeat; returns the number of roots that were newly added.
    pub fn register_import_roots(
        &self,
        roots: &ImportRoots,
        team: &str,
        agent: Option<&str>,
    ) -> Result<usize, RegistryError> {
        let team_location = self.resolve_team_location(team)?;
        let agent_location = agent
            .map(|agent| self.resolve_agent_location(team, agent))
            .transpose()?;

        let shared = self.root.join(&self.layout.shared_dir);
        let shared = if shared.is_dir() {
            shared
        } else {
            self.root.join(&self.layout.legacy_shared_dir)
        };

        let mut added = 0;
        let mut candidates = vec![shared, team_location.path.clone()];
        if let Ok(utils) = self.resolve_team_utils_location(team) {
            candidates.push(utils.path);
        }
        if let Some(agent_location) = agent_location {
            candidates.push(agent_location.path);
        }

        for path in candidates {
            if roots.register(&path) {
                debug!(team, root = %path.display(), "Registered import root");
                added += 1;
            }
        }
        Ok(added)
    }

    fn probe_legacy_team(&self, team: &str) -> LegacyProbe {
        let expected = self.legacy_team_path(team);
        if expected.is_dir() {
            return LegacyProbe::at(expected);
        }
        let matched = find_child_dir(&self.root, |name| {
            team_name_from_legacy(name).as_deref() == Some(team)
        });
        LegacyProbe { expected, matched }
    }

    fn probe_legacy_agent(&self, team: &str, agent: &str) -> LegacyProbe {
        let team_probe = self.probe_legacy_team(team);
        let team_dir = team_probe.matched.clone().unwrap_or(team_probe.expected);
        let expected = team_dir.join(legacy_agent_dir_name(agent));
        if team_probe.matched.is_none() {
            return LegacyProbe::missing(expected);
        }
        if expected.is_dir() {
            return LegacyProbe::at(expected);
        }
        let matched = find_child_dir(&team_dir, |name| {
            agent_name_from_legacy(name).as_deref() == Some(agent)
        });
        LegacyProbe { expected, matched }
    }

    fn probe_legacy_tool(&self, team: &str, tool: &str) -> LegacyProbe {
        let team_probe = self.probe_legacy_team(team);
        let team_dir = team_probe.matched.clone().unwrap_or(team_probe.expected);
        let tool_dir = legacy_tool_dir_name(tool);
        let expected = team_dir
            .join("*_Agent")
            .join(&self.layout.tools_dir)
            .join(&tool_dir);
        if team_probe.matched.is_none() {
            return LegacyProbe::missing(expected);
        }

        let matched = child_dirs(&team_dir)
            .into_iter()
            .filter(|(name, _)| agent_name_from_legacy(name).is_some())
            .find_map(|(_, agent_dir)| {
                let tools_dir = agent_dir.join(&self.layout.tools_dir);
                let exact = tools_dir.join(&tool_dir);
                if exact.is_dir() {
                    return Some(exact);
                }
                find_child_dir(&tools_dir, |name| {
                    tool_name_from_legacy(name).as_deref() == Some(tool)
                })
            });
        LegacyProbe { expected, matched }
    }
}

fn check_name(kind: ComponentKind, name: &str) -> Result<(), RegistryError> {
    if is_valid_component_name(name) {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(format!("{} name '{}'", kind, name)))
    }
}

/// Immediate subdirectories of `parent` as `(name, path)`, sorted by file name.
/// A missing parent yields an empty list; unreadable entries are logged and skipped.
pub(crate) fn child_dirs(parent: &Path) -> Vec<(String, PathBuf)> {
    if !parent.is_dir() {
        return Vec::new();
    }
    let mut dirs = Vec::new();
    for entry in WalkDir::new(parent)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_dir() {
                    continue;
                }
                match entry.file_name().to_str() {
                    Some(name) => dirs.push((name.to_string(), entry.into_path())),
                    None => debug!(path = %entry.path().display(), "Skipping non UTF-8 directory"),
                }
            }
            Err(e) => warn!("Error accessing directory entry: {}", e),
        }
    }
    dirs
}

fn find_child_dir(parent: &Path, matches: impl Fn(&str) -> bool) -> Option<PathBuf> {
    child_dirs(parent)
        .into_iter()
        .find(|(name, _)| matches(name))
        .map(|(_, path)| path)
}
