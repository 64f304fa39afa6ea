//! Workspace layout configuration.

pub mod layout;
