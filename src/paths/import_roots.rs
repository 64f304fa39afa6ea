//! Resource search roots.
//!
//! Ordered set of directories consulted when a component resolves a relative
//! resource (prompt templates, shared fixtures). Later registrations take
//! priority over earlier ones.

use parking_lot::RwLock;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct ImportRoots {
    /// Highest priority first
    roots: RwLock<Vec<PathBuf>>,
}

impl ImportRoots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` with the highest priority.
    ///
    /// Returns false when the path does not exist or is already registered; the
    /// existing priority of a registered path is left untouched.
    pub fn register(&self, path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }
        let canonical = match dunce::canonicalize(path) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Failed to canonicalize import root {}: {}", path.display(), e);
                return false;
            }
        };

        let mut roots = self.roots.write();
        if roots.contains(&canonical) {
            return false;
        }
        roots.insert(0, canonical);
        true
    }

    /// Snapshot of the registered roots, highest priority first.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots.read().clone()
    }

    pub fn len(&self) -> usize {
        self.roots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.read().is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.roots.read().contains(&canonical)
    }

    /// First existing `root/relative` in priority order.
    pub fn find(&self, relative: &Path) -> Option<PathBuf> {
        self.roots
            .read()
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.exists())
    }
}
