//! Path resolution for the nested (`teams/...`) and flat legacy layouts.

pub mod import_roots;
pub mod layout;
pub mod resolver;

pub use import_roots::ImportRoots;
pub use layout::{ComponentLocation, LayoutHit};
pub use resolver::PathResolver;
