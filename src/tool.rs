//! Tool contract.
//!
//! Tools are structural: anything with a name and an `invoke` operation. The
//! registry binds a tool directory to a factory from the catalog and hands the
//! factory a [`ToolContext`] with the parsed `tool.toml`.

use crate::error::ToolError;
use crate::paths::ComponentLocation;
use crate::registry::definition::ToolDefinition;
use crate::types::ComponentName;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &ComponentName;

    async fn invoke(&self, input: Value) -> Result<Value, ToolError>;
}

/// Construction input for tool factories
#[derive(Debug, Clone)]
pub struct ToolContext {
    name: ComponentName,
    location: ComponentLocation,
    definition: Arc<ToolDefinition>,
}

impl ToolContext {
    pub fn new(
        name: ComponentName,
        location: ComponentLocation,
        definition: Arc<ToolDefinition>,
    ) -> Self {
        Self {
            name,
            location,
            definition,
        }
    }

    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    pub fn location(&self) -> &ComponentLocation {
        &self.location
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// The `[config]` table of `tool.toml`
    pub fn config(&self) -> &toml::Table {
        &self.definition.config
    }

    /// Typed view of one `[config]` entry.
    pub fn config_value<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, ToolError> {
        self.definition
            .config
            .get(key)
            .cloned()
            .map(|value| {
                value.try_into().map_err(|e: toml::de::Error| {
                    ToolError::InvalidInput(format!("config.{}: {}", key, e))
                })
            })
            .transpose()
    }
}
