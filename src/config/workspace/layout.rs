//! WorkspaceConfig: directory names of the nested and flat layouts.

use serde::{Deserialize, Serialize};

fn default_teams_dir() -> String {
    "teams".to_string()
}

fn default_agents_dir() -> String {
    "agents".to_string()
}

fn default_tools_dir() -> String {
    "tools".to_string()
}

fn default_utils_dir() -> String {
    "utils".to_string()
}

fn default_shared_dir() -> String {
    "shared".to_string()
}

fn default_legacy_shared_dir() -> String {
    "utils".to_string()
}

/// Workspace layout configuration
///
/// All entries are single path segments relative to the workspace root (or to a
/// team directory for `agents_dir`, `tools_dir` and `utils_dir`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root of the nested layout: `{teams_dir}/{team}`
    #[serde(default = "default_teams_dir")]
    pub teams_dir: String,

    /// Agent directories inside a team: `{team}/{agents_dir}/{agent}`
    #[serde(default = "default_agents_dir")]
    pub agents_dir: String,

    /// Tool directories inside a team: `{team}/{tools_dir}/{tool}`
    #[serde(default = "default_tools_dir")]
    pub tools_dir: String,

    /// Team-specific utilities: `{team}/{utils_dir}`
    #[serde(default = "default_utils_dir")]
    pub utils_dir: String,

    /// Cross-team shared resources: `{shared_dir}/{category}`
    #[serde(default = "default_shared_dir")]
    pub shared_dir: String,

    /// Shared resources in the flat layout: `{legacy_shared_dir}/{category}`
    #[serde(default = "default_legacy_shared_dir")]
    pub legacy_shared_dir: String,
}

impl WorkspaceConfig {
    /// Check that every entry is a single, non-empty path segment.
    pub fn validate(&self) -> Result<(), String> {
        let entries = [
            ("teams_dir", &self.teams_dir),
            ("agents_dir", &self.agents_dir),
            ("tools_dir", &self.tools_dir),
            ("utils_dir", &self.utils_dir),
            ("shared_dir", &self.shared_dir),
            ("legacy_shared_dir", &self.legacy_shared_dir),
        ];
        for (key, value) in entries {
            if value.trim().is_empty() {
                return Err(format!("workspace.{} cannot be empty", key));
            }
            if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
                return Err(format!(
                    "workspace.{} must be a single directory name, got '{}'",
                    key, value
                ));
            }
        }
        Ok(())
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            teams_dir: default_teams_dir(),
            agents_dir: default_agents_dir(),
            tools_dir: default_tools_dir(),
            utils_dir: default_utils_dir(),
            shared_dir: default_shared_dir(),
            legacy_shared_dir: default_legacy_shared_dir(),
        }
    }
}
