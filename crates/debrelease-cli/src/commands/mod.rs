//! CLI command implementations

use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::{Context, Result};
use debrelease_config::{Config, FailurePolicy, MetadataResolver};

pub mod init;
pub mod package;
pub mod release;
pub mod validate;

pub use init::InitCommand;
pub use package::PackageCommand;
pub use release::ReleaseCommand;
pub use validate::ValidateCommand;

/// Configuration file used when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "debrelease.yaml";

/// Build toggles shared by `package` and `release`
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Also build binary packages in a pbuilder chroot
    #[arg(long)]
    pub chroot: bool,

    /// Build but do not upload
    #[arg(long)]
    pub no_upload: bool,

    /// Skip the upstream test suite during builds
    #[arg(long)]
    pub no_tests: bool,

    /// Comma separated distributions, overriding the configuration
    #[arg(long, value_name = "LIST")]
    pub distributions: Option<String>,

    /// Keep building the remaining distributions after one fails
    #[arg(long)]
    pub continue_on_failure: bool,
}

impl BuildArgs {
    /// Fold the flags into `config`; flags only ever switch things on
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        config.build.chroot |= self.chroot;
        config.build.no_upload |= self.no_upload;
        config.build.no_tests |= self.no_tests;
        if self.continue_on_failure {
            config.build.failure_policy = FailurePolicy::Continue;
        }
        if let Some(list) = &self.distributions {
            config.package.set("distributions", list.as_str())?;
        }
        config.validate()?;
        Ok(())
    }
}

/// Load the configuration file and apply command line overrides
pub fn load_config(path: &Path, args: &BuildArgs) -> Result<Config> {
    let mut config = Config::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    args.apply(&mut config)?;
    Ok(config)
}

/// Resolver whose relative copyright paths start at the config file
pub fn resolver_for(config_path: &Path) -> MetadataResolver {
    match config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => MetadataResolver::new().with_base_dir(dir),
        None => MetadataResolver::new(),
    }
}

/// Source tree from the flag, falling back to the configuration
pub fn source_tree(flag: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    flag.or_else(|| config.build.source_tree.clone()).ok_or_else(|| {
        color_eyre::eyre::eyre!("No source tree given; pass --source or set build.source_tree")
    })
}
