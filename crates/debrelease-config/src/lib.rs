//! Configuration management for debrelease
//!
//! This crate handles YAML configuration parsing, the `DEBRELEASE_*`
//! environment overlay, environment variable substitution, and the
//! resolution of the flat package settings into [`PackageMetadata`].
//!
//! [`PackageMetadata`]: debrelease_core::PackageMetadata

use std::path::{Path, PathBuf};

use debrelease_core::error::{Error, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

pub mod raw;
pub mod resolver;

pub use raw::RawConfig;
pub use resolver::MetadataResolver;

/// Prefix of the environment variables overlaid onto the package settings
pub const ENV_PREFIX: &str = "DEBRELEASE_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Flat package settings
    #[serde(default)]
    pub package: RawConfig,

    /// Build toggles
    #[serde(default)]
    pub build: BuildOptions,

    /// External tool names and locations
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// What to do with the remaining distributions once one fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run at the first failed distribution
    #[default]
    Abort,
    /// Attempt every distribution, then report all failures
    Continue,
}

/// Per-run build toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Source tree to package
    pub source_tree: Option<PathBuf>,

    /// Build binaries in the distribution's pbuilder chroot
    pub chroot: bool,

    /// Skip `dput`
    pub no_upload: bool,

    /// No-op the package's test target
    pub no_tests: bool,

    /// Continue-vs-abort decision for distribution failures
    pub failure_policy: FailurePolicy,

    /// Counter after the distribution name in build versions
    pub archive_revision: u32,

    /// Urgency written into the changelog top line
    pub urgency: String,

    /// Keep sudo credentials fresh while chroot builds run
    pub keep_privileges: bool,

    /// Accept a tree that already carries a `debian/` directory
    pub reuse_existing_skeleton: bool,

    /// Marker directory for the release automation
    pub tracking_dir: PathBuf,

    /// Where the release automation stages a fresh copy of each release
    pub work_dir: PathBuf,
}

/// External tools invoked by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Skeleton generator
    pub skeleton: String,
    /// Source package builder
    pub build: String,
    /// Chroot builder
    pub chroot: String,
    /// Archive upload tool
    pub upload: String,
    /// Privilege escalation tool
    pub sudo: String,
    /// Directory holding `<distribution>-base.tgz` chroot images
    pub chroot_base_dir: PathBuf,
    /// Where the chroot builder drops binary packages
    pub build_result_dir: PathBuf,
    /// Seconds between credential refreshes
    pub privilege_refresh_secs: u64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_tree: None,
            chroot: false,
            no_upload: false,
            no_tests: false,
            failure_policy: FailurePolicy::Abort,
            archive_revision: debrelease_core::version::DEFAULT_ARCHIVE_REVISION,
            urgency: "medium".to_string(),
            keep_privileges: true,
            reuse_existing_skeleton: false,
            tracking_dir: PathBuf::from("/var/lib/debrelease/packaged"),
            work_dir: PathBuf::from("/var/lib/debrelease/work"),
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            skeleton: "dh_make".to_string(),
            build: "debuild".to_string(),
            chroot: "pbuilder".to_string(),
            upload: "dput".to_string(),
            sudo: "sudo".to_string(),
            chroot_base_dir: PathBuf::from("/var/cache/pbuilder"),
            build_result_dir: PathBuf::from("/var/cache/pbuilder/result"),
            privilege_refresh_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigError {
            message: format!("Failed to read config file {path:?}: {e}"),
        })?;

        let mut config = Self::from_yaml(&content)?;
        config.package.overlay(std::env::vars())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML text and expand environment variables
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError { message: format!("Failed to parse YAML: {e}") })?;

        config.expand_env_vars()?;
        Ok(config)
    }

    /// Expand environment variables in values and paths
    fn expand_env_vars(&mut self) -> Result<()> {
        self.package.expand_with(expand_value)?;

        if let Some(tree) = &self.build.source_tree {
            self.build.source_tree = Some(expand_path(tree)?);
        }
        self.build.tracking_dir = expand_path(&self.build.tracking_dir)?;
        self.build.work_dir = expand_path(&self.build.work_dir)?;
        self.toolchain.chroot_base_dir = expand_path(&self.toolchain.chroot_base_dir)?;
        self.toolchain.build_result_dir = expand_path(&self.toolchain.build_result_dir)?;

        Ok(())
    }

    /// Validate the build and toolchain sections.
    ///
    /// Package settings are validated by [`MetadataResolver`].
    pub fn validate(&self) -> Result<()> {
        if self.build.urgency.trim().is_empty() {
            return Err(Error::config("urgency cannot be empty"));
        }

        for (field, tool) in [
            ("toolchain.skeleton", &self.toolchain.skeleton),
            ("toolchain.build", &self.toolchain.build),
            ("toolchain.chroot", &self.toolchain.chroot),
            ("toolchain.upload", &self.toolchain.upload),
            ("toolchain.sudo", &self.toolchain.sudo),
        ] {
            if tool.trim().is_empty() {
                return Err(Error::config(format!("{field} cannot be empty")));
            }
        }

        if self.build.chroot && self.build.keep_privileges && self.toolchain.privilege_refresh_secs == 0
        {
            return Err(Error::config("privilege_refresh_secs must be at least 1"));
        }

        Ok(())
    }
}

fn env_var_regex() -> Regex {
    // Braced names are restricted to identifiers so debian substvars such as
    // ${misc:Depends} pass through untouched.
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("Valid regex")
}

/// Expand environment variables in a single value
pub fn expand_value(value: &str) -> Result<String> {
    let mut missing = None;
    let expanded = env_var_regex().replace_all(value, |cap: &Captures| {
        let var_name = cap.get(1).or_else(|| cap.get(2)).map_or("", |m| m.as_str());
        std::env::var(var_name).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| var_name.to_string());
            String::new()
        })
    });

    match missing {
        Some(var_name) => Err(Error::ConfigError {
            message: format!("Environment variable not found: {var_name}"),
        }),
        None => Ok(expanded.into_owned()),
    }
}

/// Expand environment variables in a path
fn expand_path(path: &Path) -> Result<PathBuf> {
    expand_value(&path.to_string_lossy()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn test_expand_value() {
        env::set_var("RELEASE_TEST_ROOT", "/srv/releases");

        assert_eq!(expand_value("${RELEASE_TEST_ROOT}/sub").unwrap(), "/srv/releases/sub");
        assert_eq!(expand_value("$RELEASE_TEST_ROOT/sub").unwrap(), "/srv/releases/sub");
        assert_eq!(expand_value("${misc:Depends}").unwrap(), "${misc:Depends}");
        assert!(expand_value("$RELEASE_TEST_SURELY_UNSET").is_err());
    }

    #[test]
    fn test_expand_value_with_shared_prefix() {
        env::set_var("RELEASE_TEST_PFX", "short");
        env::set_var("RELEASE_TEST_PFXLONG", "long");

        assert_eq!(
            expand_value("$RELEASE_TEST_PFX/$RELEASE_TEST_PFXLONG").unwrap(),
            "short/long"
        );
    }

    #[test]
    fn test_config_from_yaml() {
        let config = Config::from_yaml(
            r#"
package:
  name: foo
  version: "1.0"
  build_depends: [libssl-dev, zlib1g-dev]
  distributions: bionic,focal
build:
  no_upload: true
  failure_policy: continue
toolchain:
  upload: /usr/local/bin/dput
"#,
        )
        .unwrap();

        assert_eq!(config.package.get("name"), Some("foo"));
        assert_eq!(config.package.get("build_depends"), Some("libssl-dev,zlib1g-dev"));
        assert!(config.build.no_upload);
        assert!(!config.build.chroot);
        assert_eq!(config.build.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.build.archive_revision, 1);
        assert_eq!(config.toolchain.upload, "/usr/local/bin/dput");
        assert_eq!(config.toolchain.build, "debuild");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.toolchain.build = " ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("toolchain.build"));
    }
}
