//! Agentry: Agent, Tool and Team Registry
//!
//! Discovers agents, tools and teams from a workspace directory tree, resolves
//! symbolic names to directories across the current and legacy layouts, and
//! instantiates components from a catalog of compiled factories.

pub mod agent;
pub mod compat;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod paths;
pub mod registry;
pub mod team;
pub mod tool;
pub mod tooling;
pub mod types;
pub mod usage;

pub use error::{AgentExecutionError, FailureKind, RegistryError, ToolError};
pub use paths::{ComponentLocation, ImportRoots, LayoutHit, PathResolver};
pub use registry::{ComponentCatalog, ComponentRegistry, DiscoveryReport};
pub use types::{ComponentKind, ComponentName};
