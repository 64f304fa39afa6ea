//! Integration tests over temporary workspaces

mod agent_execution;
mod cli_contracts;
mod discovery;
mod resolution;
mod support;
