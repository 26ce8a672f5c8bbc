//! Validate command implementation

use std::path::PathBuf;

use color_eyre::eyre::{eyre, Context, Result};
use debrelease_build::{needs_skeleton, ProcessToolRunner, Toolchain};
use debrelease_debian::DebhelperCompatResolver;
use tracing::{info, warn};

use super::{load_config, resolver_for, BuildArgs};

/// Validate command implementation
pub struct ValidateCommand {
    config_path: PathBuf,
    check_tools: bool,
}

impl ValidateCommand {
    pub fn new(config_path: PathBuf, check_tools: bool) -> Self {
        Self { config_path, check_tools }
    }

    pub async fn execute(&self) -> Result<()> {
        info!("Validating configuration");

        let config = load_config(&self.config_path, &BuildArgs::default())?;
        println!("✓ Configuration loaded successfully");

        let metadata = resolver_for(&self.config_path)
            .resolve(&config.package)
            .context("Invalid package settings")?;
        println!("✓ Package {} {}", metadata.name, metadata.source_version());
        println!("  Maintainer:  {}", metadata.maintainer());
        println!("  Archive:     {}", metadata.archive);
        println!("  Copyright:   {}", metadata.copyright.license_arg());
        println!("  Section:     {}", metadata.section);
        if !metadata.build_depends.is_empty() {
            println!("  Build-Depends: {}", metadata.build_depends.join(", "));
        }
        if !metadata.depends.is_empty() {
            println!("  Depends:     {}", metadata.depends.join(", "));
        }

        let compat = DebhelperCompatResolver::new();
        println!("✓ Distributions:");
        for distribution in &metadata.distributions {
            let descriptor = compat.resolve(*distribution);
            println!("  - {distribution}: {}", descriptor.dependency);
        }

        match &config.build.source_tree {
            Some(tree) if tree.is_dir() => println!("✓ Source tree: {}", tree.display()),
            Some(tree) => warn!("Source tree does not exist: {}", tree.display()),
            None => {}
        }

        if self.check_tools {
            let toolchain = Toolchain::new(config.toolchain.clone());
            let generate_skeleton = config
                .build
                .source_tree
                .as_deref()
                .map_or(true, |tree| needs_skeleton(&config.build, tree));
            let missing =
                toolchain.missing_programs(&ProcessToolRunner::new(), &config.build, generate_skeleton);
            if !missing.is_empty() {
                return Err(eyre!("Missing tools: {}", missing.join(", ")));
            }
            println!("✓ Toolchain available");
        }

        println!("\n✓ All validation checks passed!");
        Ok(())
    }
}
