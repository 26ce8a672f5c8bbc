//! Init command implementation

use std::path::PathBuf;

use color_eyre::eyre::{Context, Result};
use debrelease_config::{Config, RawConfig};
use tracing::info;

const HEADER: &str = "\
# debrelease configuration
#
# package: settings every build needs. Values may reference environment
# variables as $VAR or ${VAR}, and each key can be overridden with a
# DEBRELEASE_<KEY> variable (e.g. DEBRELEASE_VERSION=1.2.3).
#   copyright      path to a copyright file, or one of apache, artistic, bsd,
#                  gpl, gpl2, gpl3, isc, lgpl, lgpl2, lgpl3, mit, custom
#   version        quote it (\"3.10\") so YAML keeps every digit; same for revision
#   distributions  comma separated; defaults to every supported series
#   build_depends  comma separated, one package or relation per entry
#
# build: run toggles. failure_policy is abort or continue. The release
# command copies each release into work_dir and records it in tracking_dir.
# toolchain: external program names and pbuilder locations.

";

/// Init command implementation
pub struct InitCommand {
    output_path: PathBuf,
    force: bool,
}

impl InitCommand {
    pub fn new(output_path: PathBuf, force: bool) -> Self {
        Self { output_path, force }
    }

    pub async fn execute(&self) -> Result<()> {
        info!("Initializing configuration file at {}", self.output_path.display());

        if self.output_path.exists() && !self.force {
            return Err(color_eyre::eyre::eyre!(
                "Configuration file already exists: {}. Use --force to overwrite.",
                self.output_path.display()
            ));
        }

        let content = Self::render()?;
        std::fs::write(&self.output_path, content)
            .with_context(|| format!("Failed to write config to {}", self.output_path.display()))?;

        println!("✓ Created configuration file: {}", self.output_path.display());
        println!("\nNext steps:");
        println!("1. Fill in the package section");
        println!(
            "2. Run 'debrelease validate -c {}' to check it",
            self.output_path.display()
        );
        println!(
            "3. Run 'debrelease package -c {} --source DIR' to build",
            self.output_path.display()
        );

        Ok(())
    }

    /// Starter configuration text
    pub fn render() -> Result<String> {
        let yaml = serde_yaml::to_string(&Self::starter_config()?)
            .context("Failed to serialize config to YAML")?;
        Ok(format!("{HEADER}{yaml}"))
    }

    fn starter_config() -> Result<Config> {
        let package = RawConfig::from_pairs([
            ("name", "hello"),
            ("version", "1.0.0"),
            ("revision", "1"),
            ("copyright", "mit"),
            ("archive", "ppa:your-team/your-ppa"),
            ("email", "packager@example.org"),
            ("maintainer", "Your Name"),
            ("description", "Short one-line description"),
            ("long_description", "Longer description.\n\nBlank lines become paragraph breaks."),
            ("homepage", "https://example.org/hello"),
            ("section", "misc"),
            ("distributions", "focal,jammy,noble"),
        ])?;

        Ok(Config { package, ..Default::default() })
    }
}
