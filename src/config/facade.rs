//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::AgentryConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<AgentryConfig, ConfigError> {
        MergeService::load(workspace_root)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<AgentryConfig, ConfigError> {
        MergeService::load_from_file(path)
    }
}
