//! Backward compatibility between the nested and flat layouts.
//!
//! Resolution always probes the current layout first and falls back to the legacy
//! layout only on a miss. The shim is read-only: legacy directories are never moved,
//! rewritten or migrated, so both layouts can coexist.

use crate::error::RegistryError;
use crate::paths::layout::{ComponentLocation, LayoutHit};
use crate::types::ComponentKind;
use std::path::PathBuf;

/// Outcome of probing the legacy layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyProbe {
    /// Canonical legacy path for the name, reported on a double miss
    pub expected: PathBuf,
    /// Directory that actually matched, if any
    pub matched: Option<PathBuf>,
}

impl LegacyProbe {
    pub fn missing(expected: PathBuf) -> Self {
        Self {
            expected,
            matched: None,
        }
    }

    /// Probe a single candidate directory.
    pub fn at(expected: PathBuf) -> Self {
        let matched = expected.is_dir().then(|| expected.clone());
        Self { expected, matched }
    }
}

/// Two-state resolution: `CURRENT_LAYOUT_HIT` or `LEGACY_LAYOUT_HIT`, `NotFound` otherwise.
pub struct BackwardCompatibilityShim;

impl BackwardCompatibilityShim {
    /// Resolve `name` to `current` if it is a directory, otherwise to the legacy probe result.
    ///
    /// `legacy` is only evaluated on a current-layout miss.
    pub fn resolve<F>(
        kind: ComponentKind,
        name: &str,
        current: PathBuf,
        legacy: F,
    ) -> Result<ComponentLocation, RegistryError>
    where
        F: FnOnce() -> LegacyProbe,
    {
        if current.is_dir() {
            return Ok(ComponentLocation::current(current));
        }

        let probe = legacy();
        match probe.matched {
            Some(path) => {
                tracing::debug!(
                    kind = %kind,
                    name,
                    current = %current.display(),
                    legacy = %path.display(),
                    hit = %LayoutHit::Legacy,
                    "Resolved via legacy layout"
                );
                Ok(ComponentLocation::legacy(path))
            }
            None => Err(RegistryError::NotFound {
                kind,
                name: name.to_string(),
                current,
                legacy: probe.expected,
            }),
        }
    }
}
