//! Per-distribution build versions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::metadata::PackageMetadata;

/// Archive revision used when a run does not override it
pub const DEFAULT_ARCHIVE_REVISION: u32 = 1;

/// Version assigned to one distribution's source package.
///
/// Rendered as `<upstream>-<revision>~<distribution><counter>`. The tilde
/// sorts the backport below the plain `<upstream>-<revision>` release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildVersion {
    pub upstream: String,
    pub revision: String,
    pub distribution: Distribution,
    pub counter: u32,
}

impl BuildVersion {
    /// Assign the build version for `distribution`
    pub fn assign(metadata: &PackageMetadata, distribution: Distribution, counter: u32) -> Self {
        Self {
            upstream: metadata.upstream_version.clone(),
            revision: metadata.revision.clone(),
            distribution,
            counter,
        }
    }

    /// Version without epoch, as used in artifact file names
    pub fn file_version(&self) -> String {
        let full = self.to_string();
        match full.split_once(':') {
            Some((_, rest)) => rest.to_string(),
            None => full,
        }
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}~{}{}", self.upstream, self.revision, self.distribution, self.counter)
    }
}
