//! Package command implementation

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::{Context, Result};
use debrelease_build::{create_progress_ui, BuildOrchestrator, ProcessToolRunner, RunReport};
use tracing::info;

use super::{load_config, resolver_for, source_tree, BuildArgs};

/// Package command implementation
pub struct PackageCommand {
    config_path: PathBuf,
    source: Option<PathBuf>,
    report_path: Option<PathBuf>,
    args: BuildArgs,
}

impl PackageCommand {
    pub fn new(
        config_path: PathBuf,
        source: Option<PathBuf>,
        report_path: Option<PathBuf>,
        args: BuildArgs,
    ) -> Self {
        Self { config_path, source, report_path, args }
    }

    pub async fn execute(&self) -> Result<()> {
        let config = load_config(&self.config_path, &self.args)?;
        let metadata = resolver_for(&self.config_path)
            .resolve(&config.package)
            .context("Invalid package settings")?;
        let tree = source_tree(self.source.clone(), &config)?;

        info!(
            "Packaging {} {} from {} for {}",
            metadata.name,
            metadata.source_version(),
            tree.display(),
            metadata
                .distributions
                .iter()
                .map(|d| d.codename())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let orchestrator = BuildOrchestrator::new(
            Arc::new(ProcessToolRunner::new()),
            config.toolchain.clone(),
            config.build.clone(),
        )
        .with_progress(create_progress_ui(std::io::stderr().is_terminal()));

        let mut report = RunReport::new(&metadata.name, &metadata.upstream_version);
        let result = orchestrator.execute(&metadata, &tree, &mut report).await;

        if let Some(path) = &self.report_path {
            std::fs::write(path, report.to_json()?)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Run report written to {}", path.display());
        }

        result?;
        println!("✓ {}", report.summary());
        Ok(())
    }
}
