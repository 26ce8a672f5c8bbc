//! Release command implementation

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::Result;
use debrelease_build::{
    create_progress_ui, summarize, BuildOrchestrator, ManifestReleaseSource, ProcessToolRunner,
    ReleaseAutomation, ReleaseOutcome, VersionTracker,
};
use tracing::info;

use super::{load_config, resolver_for, BuildArgs};

/// Release command implementation
pub struct ReleaseCommand {
    config_path: PathBuf,
    releases: PathBuf,
    tracking_dir: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    args: BuildArgs,
}

impl ReleaseCommand {
    pub fn new(
        config_path: PathBuf,
        releases: PathBuf,
        tracking_dir: Option<PathBuf>,
        work_dir: Option<PathBuf>,
        args: BuildArgs,
    ) -> Self {
        Self { config_path, releases, tracking_dir, work_dir, args }
    }

    pub async fn execute(&self) -> Result<()> {
        let mut config = load_config(&self.config_path, &self.args)?;
        if let Some(dir) = &self.tracking_dir {
            config.build.tracking_dir = dir.clone();
        }
        if let Some(dir) = &self.work_dir {
            config.build.work_dir = dir.clone();
        }
        info!("Staging releases in {}", config.build.work_dir.display());

        let orchestrator = BuildOrchestrator::new(
            Arc::new(ProcessToolRunner::new()),
            config.toolchain.clone(),
            config.build.clone(),
        )
        .with_progress(create_progress_ui(std::io::stderr().is_terminal()));

        let automation = ReleaseAutomation::new(
            config.package.clone(),
            orchestrator,
            VersionTracker::new(&config.build.tracking_dir),
        )
        .with_resolver(resolver_for(&self.config_path));
        info!("Tracking packaged versions in {}", automation.tracker().dir().display());

        let results = automation
            .run_from(&ManifestReleaseSource::new(&self.releases))
            .await?;

        for result in &results {
            match &result.outcome {
                ReleaseOutcome::Packaged(report) => println!("✓ {}", report.summary()),
                ReleaseOutcome::Skipped => println!("- {} already packaged", result.version),
            }
        }
        let (packaged, skipped) = summarize(&results);
        println!("\n{packaged} release(s) packaged, {skipped} skipped");
        Ok(())
    }
}
