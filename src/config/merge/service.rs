//! MergeService: orchestrates sources and deserializes to AgentryConfig.

use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::AgentryConfig;
use config::{Config, ConfigError, File};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from workspace and standard sources.
    /// Precedence: defaults (lowest) -> global file -> workspace file -> environment (highest).
    pub fn load(workspace_root: &Path) -> Result<AgentryConfig, ConfigError> {
        let builder = Config::builder();
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder)?;

        Self::finish(builder.build()?)
    }

    /// Load config from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<AgentryConfig, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path))
            .add_source(environment::environment_source());

        Self::finish(builder.build()?)
    }

    fn finish(config: Config) -> Result<AgentryConfig, ConfigError> {
        let config: AgentryConfig = config.try_deserialize()?;
        config.workspace.validate().map_err(ConfigError::Message)?;
        Ok(config)
    }
}
