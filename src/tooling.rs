//! Tooling
//!
//! Command-line surface over the component registry.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
