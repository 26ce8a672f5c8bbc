//! Resolved package metadata

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::{Error, Result};

/// Everything the templater and orchestrator need to know about a package.
///
/// Built once by the metadata resolver and shared by reference afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Source package name
    pub name: String,

    /// Upstream version
    pub upstream_version: String,

    /// Packaging revision appended after the upstream version
    pub revision: String,

    /// Copyright for `debian/copyright`
    pub copyright: Copyright,

    /// Upload target, e.g. `ppa:owner/name`
    pub archive: String,

    /// Maintainer email
    pub maintainer_email: String,

    /// Maintainer display name
    pub maintainer_name: String,

    /// Short description
    pub description: String,

    /// Long description, already normalized into continuation lines
    pub long_description: String,

    /// Upstream homepage
    pub homepage: String,

    /// Archive section
    pub section: String,

    /// Optional Vcs-Browser URL
    pub vcs_browser: Option<String>,

    /// Optional Vcs-Git URL
    pub vcs_git: Option<String>,

    /// Build-time dependencies
    pub build_depends: Vec<String>,

    /// Run-time dependencies
    pub depends: Vec<String>,

    /// Target distributions, in build order
    pub distributions: Vec<Distribution>,
}

/// Copyright source for the generated package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Copyright {
    /// Use an existing file verbatim
    CustomFile { path: PathBuf, text: String },

    /// One of the skeleton generator's stock licenses
    License(License),
}

/// Stock licenses understood by `dh_make --copyright`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum License {
    Apache,
    Artistic,
    Bsd,
    Gpl,
    Gpl2,
    Gpl3,
    Isc,
    Lgpl,
    Lgpl2,
    Lgpl3,
    Mit,
    Custom,
}

impl License {
    /// Every accepted identifier
    pub const ALL: [License; 12] = [
        License::Apache,
        License::Artistic,
        License::Bsd,
        License::Gpl,
        License::Gpl2,
        License::Gpl3,
        License::Isc,
        License::Lgpl,
        License::Lgpl2,
        License::Lgpl3,
        License::Mit,
        License::Custom,
    ];

    /// Identifier as passed to the skeleton generator
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apache => "apache",
            Self::Artistic => "artistic",
            Self::Bsd => "bsd",
            Self::Gpl => "gpl",
            Self::Gpl2 => "gpl2",
            Self::Gpl3 => "gpl3",
            Self::Isc => "isc",
            Self::Lgpl => "lgpl",
            Self::Lgpl2 => "lgpl2",
            Self::Lgpl3 => "lgpl3",
            Self::Mit => "mit",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for License {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == wanted)
            .ok_or_else(|| {
                let accepted = Self::ALL
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Error::config(format!(
                    "Copyright '{s}' is neither an existing file nor a known license ({accepted})"
                ))
            })
    }
}

impl Copyright {
    /// Value for `dh_make --copyright`
    pub fn license_arg(&self) -> &'static str {
        match self {
            Self::CustomFile { .. } => License::Custom.as_str(),
            Self::License(license) => license.as_str(),
        }
    }

    /// Value for `dh_make --copyrightfile`, if any
    pub fn custom_file(&self) -> Option<&PathBuf> {
        match self {
            Self::CustomFile { path, .. } => Some(path),
            Self::License(_) => None,
        }
    }
}

impl PackageMetadata {
    /// `<upstream>-<revision>`, the version before any distribution suffix
    pub fn source_version(&self) -> String {
        format!("{}-{}", self.upstream_version, self.revision)
    }

    /// `Name <email>` as written into changelogs
    pub fn maintainer(&self) -> String {
        format!("{} <{}>", self.maintainer_name, self.maintainer_email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_from_str() {
        assert_eq!(License::from_str("GPL3").unwrap(), License::Gpl3);
        assert_eq!(License::from_str("mit").unwrap(), License::Mit);
        assert!(License::from_str("wtfpl").unwrap_err().is_configuration());
    }

    #[test]
    fn test_copyright_arguments() {
        let stock = Copyright::License(License::Bsd);
        assert_eq!(stock.license_arg(), "bsd");
        assert!(stock.custom_file().is_none());

        let custom = Copyright::CustomFile {
            path: PathBuf::from("/src/LICENSE"),
            text: "All rights reserved".to_string(),
        };
        assert_eq!(custom.license_arg(), "custom");
        assert_eq!(custom.custom_file(), Some(&PathBuf::from("/src/LICENSE")));
    }
}
