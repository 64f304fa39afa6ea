//! Component registry
//!
//! Discovers agents, tools and teams on disk, binds them to factories from the
//! [`ComponentCatalog`] and serves lookups by symbolic name.

pub mod catalog;
pub mod component_registry;
pub mod definition;
mod discovery;

pub use catalog::{AgentFactory, ComponentCatalog, TeamFactory, ToolFactory};
pub use component_registry::{
    AgentDescriptor, ComponentRegistry, DiscoveryReport, SkippedComponent, TeamDescriptor,
    ToolDescriptor,
};
pub use definition::{
    AgentDefinition, AgentLlmOverrides, TeamDefinition, ToolDefinition, AGENT_DEFINITION_FILE,
    TEAM_DEFINITION_FILE, TOOL_DEFINITION_FILE,
};
