//! Debhelper compatibility per target distribution

use debrelease_core::Distribution;
use serde::{Deserialize, Serialize};

/// Highest compatibility level that still needs a `debian/compat` file.
///
/// The `debhelper-compat (= N)` virtual package only exists above it.
pub const LEGACY_COMPAT_THRESHOLD: u32 = 10;

/// How a distribution's debhelper compatibility is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityDescriptor {
    /// Target distribution
    pub distribution: Distribution,
    /// Required compatibility level
    pub level: u32,
    /// Build-Depends expression declaring the level
    pub dependency: String,
    /// Whether `debian/compat` must carry the level
    pub write_compat_file: bool,
}

impl CompatibilityDescriptor {
    /// Whether this is the file based (legacy) mode
    pub fn is_legacy(&self) -> bool {
        self.write_compat_file
    }
}

/// Maps distributions to [`CompatibilityDescriptor`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct DebhelperCompatResolver;

impl DebhelperCompatResolver {
    /// Create a resolver
    pub fn new() -> Self {
        Self
    }

    /// Descriptor for `distribution`
    pub fn resolve(&self, distribution: Distribution) -> CompatibilityDescriptor {
        let level = distribution.debhelper_compat();

        if level <= LEGACY_COMPAT_THRESHOLD {
            // Legacy debhelper versions look like 9.20160115ubuntu3, which an
            // exact (= 9) never matches.
            CompatibilityDescriptor {
                distribution,
                level,
                dependency: format!("debhelper (>= {level})"),
                write_compat_file: true,
            }
        } else {
            CompatibilityDescriptor {
                distribution,
                level,
                dependency: format!("debhelper-compat (= {level})"),
                write_compat_file: false,
            }
        }
    }
}
