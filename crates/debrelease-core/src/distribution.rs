//! Supported target distributions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ubuntu series a source package can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Ubuntu 16.04
    Xenial,
    /// Ubuntu 18.04
    Bionic,
    /// Ubuntu 20.04
    Focal,
    /// Ubuntu 22.04
    Jammy,
    /// Ubuntu 24.04
    Noble,
}

impl Distribution {
    /// Every supported distribution, oldest first
    pub const ALL: [Distribution; 5] = [
        Distribution::Xenial,
        Distribution::Bionic,
        Distribution::Focal,
        Distribution::Jammy,
        Distribution::Noble,
    ];

    /// Series codename as used in changelogs and chroot names
    pub fn codename(&self) -> &'static str {
        match self {
            Self::Xenial => "xenial",
            Self::Bionic => "bionic",
            Self::Focal => "focal",
            Self::Jammy => "jammy",
            Self::Noble => "noble",
        }
    }

    /// Debhelper compatibility level packages for this series must use
    pub fn debhelper_compat(&self) -> u32 {
        match self {
            Self::Xenial => 9,
            Self::Bionic => 11,
            Self::Focal => 12,
            Self::Jammy | Self::Noble => 13,
        }
    }

    /// Comma separated list of supported codenames, for diagnostics
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|d| d.codename())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

impl FromStr for Distribution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.codename() == s.trim().to_lowercase())
            .ok_or_else(|| {
                Error::config(format!(
                    "Unsupported distribution '{s}' (supported: {})",
                    Self::supported_list()
                ))
            })
    }
}
