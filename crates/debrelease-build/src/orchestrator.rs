//! Build orchestration logic

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use debrelease_config::{BuildOptions, FailurePolicy, ToolchainConfig};
use debrelease_core::{BuildVersion, Distribution, PackageMetadata};
use debrelease_debian::{ControlFileTemplater, DebhelperCompatResolver, TemplateOptions};
use tracing::{debug, info, warn};

use crate::context::{DistributionBuildRecord, DistributionState, RunReport};
use crate::error::{BuildError, Result};
use crate::progress_ui::{NoOpProgressUI, ProgressUI};
use crate::toolchain::{
    changes_path, dsc_path, needs_skeleton, ToolInvocation, ToolOutput, ToolRunner, Toolchain,
};
use crate::watchdog::PrivilegeWatchdog;

/// Turns one source tree into per-distribution source packages
pub struct BuildOrchestrator {
    runner: Arc<dyn ToolRunner>,
    toolchain: Toolchain,
    options: BuildOptions,
    compat: DebhelperCompatResolver,
    progress: Arc<dyn ProgressUI>,
}

impl BuildOrchestrator {
    /// Create a new build orchestrator
    pub fn new(runner: Arc<dyn ToolRunner>, toolchain: ToolchainConfig, options: BuildOptions) -> Self {
        Self {
            runner,
            toolchain: Toolchain::new(toolchain),
            options,
            compat: DebhelperCompatResolver::new(),
            progress: Arc::new(NoOpProgressUI),
        }
    }

    /// Report progress to `progress` instead of the log
    pub fn with_progress(mut self, progress: Arc<dyn ProgressUI>) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Package `source_tree` for every distribution in `metadata`
    pub async fn run(&self, metadata: &PackageMetadata, source_tree: &Path) -> Result<RunReport> {
        let mut report = RunReport::new(&metadata.name, &metadata.upstream_version);
        self.execute(metadata, source_tree, &mut report).await?;
        Ok(report)
    }

    /// Like [`Self::run`], filling `report` as distributions complete so
    /// callers still see partial progress when the run fails
    pub async fn execute(
        &self,
        metadata: &PackageMetadata,
        source_tree: &Path,
        report: &mut RunReport,
    ) -> Result<()> {
        let (tree, parent) = resolve_source_tree(source_tree)?;
        self.toolchain.ensure_available(
            self.runner.as_ref(),
            &self.options,
            needs_skeleton(&self.options, &tree),
        )?;

        let templater = ControlFileTemplater::new(&tree);
        if self.prepare_skeleton(metadata, &tree).await? {
            let template_options = TemplateOptions { run_tests: !self.options.no_tests };
            templater.apply_metadata(metadata, &template_options)?;
        }

        let watchdog = self.start_watchdog();
        self.progress.run_started(&metadata.name, metadata.distributions.len());

        let result = self
            .build_distributions(metadata, &tree, &parent, &templater, report)
            .await;

        if let Some(watchdog) = watchdog {
            watchdog.stop().await;
        }
        self.progress.finish();
        report.finish();

        match &result {
            Ok(()) => info!("{}", report.summary()),
            Err(e) => warn!("{}: {e}", report.summary()),
        }
        result
    }

    /// Generate the skeleton unless one may be reused. Returns whether the
    /// skeleton is fresh and still needs the metadata edits.
    async fn prepare_skeleton(&self, metadata: &PackageMetadata, tree: &Path) -> Result<bool> {
        let debian_dir = tree.join("debian");
        if debian_dir.exists() {
            if !self.options.reuse_existing_skeleton {
                return Err(BuildError::invalid_source_tree(
                    tree,
                    "debian/ already exists; remove it or enable reuse_existing_skeleton",
                ));
            }
            info!("Reusing existing skeleton in {}", debian_dir.display());
            return Ok(false);
        }

        info!("Generating skeleton for {} {}", metadata.name, metadata.upstream_version);
        let skeleton = self.toolchain.config().skeleton.clone();
        self.run_tool(&skeleton, &self.toolchain.skeleton_command(metadata, tree), None)
            .await?;

        if !debian_dir.is_dir() {
            return Err(BuildError::build_tool(skeleton, None, "no debian/ directory was created"));
        }
        Ok(true)
    }

    fn start_watchdog(&self) -> Option<PrivilegeWatchdog> {
        if !(self.options.chroot && self.options.keep_privileges) {
            return None;
        }
        let interval = Duration::from_secs(self.toolchain.config().privilege_refresh_secs);
        Some(PrivilegeWatchdog::spawn(
            Arc::clone(&self.runner),
            self.toolchain.privilege_refresh_command(),
            interval,
        ))
    }

    async fn build_distributions(
        &self,
        metadata: &PackageMetadata,
        tree: &Path,
        parent: &Path,
        templater: &ControlFileTemplater,
        report: &mut RunReport,
    ) -> Result<()> {
        let mut failures = Vec::new();

        for &distribution in &metadata.distributions {
            let version = BuildVersion::assign(metadata, distribution, self.options.archive_revision);
            let mut record = DistributionBuildRecord::new(distribution, version.to_string());
            self.progress.distribution_started(distribution, &record.version);
            info!("Building {} {} for {}", metadata.name, version, distribution);

            let outcome = self
                .build_distribution(metadata, &version, tree, parent, templater, &mut record)
                .await;

            match outcome {
                Ok(()) => {
                    self.advance(&mut record, DistributionState::Done);
                    info!("{distribution} done in {:.1?}", record.duration());
                    self.progress.distribution_finished(distribution, true, None);
                    report.records.push(record);
                }
                Err(e) => {
                    let message = e.to_string();
                    record.fail(&message);
                    self.progress.distribution_finished(distribution, false, Some(&message));
                    report.records.push(record);

                    match self.options.failure_policy {
                        FailurePolicy::Abort => return Err(e),
                        FailurePolicy::Continue => {
                            warn!("{distribution} failed, continuing: {message}");
                            failures.push(format!("{distribution}: {message}"));
                        }
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BuildError::DistributionsFailed { failures })
        }
    }

    async fn build_distribution(
        &self,
        metadata: &PackageMetadata,
        version: &BuildVersion,
        tree: &Path,
        parent: &Path,
        templater: &ControlFileTemplater,
        record: &mut DistributionBuildRecord,
    ) -> Result<()> {
        let distribution = version.distribution;
        let config = self.toolchain.config();

        templater.rewrite_changelog(metadata, version, &self.options.urgency)?;
        self.advance(record, DistributionState::ChangelogRewritten);

        templater.apply_compat(&self.compat.resolve(distribution))?;
        self.advance(record, DistributionState::CompatibilityResolved);

        self.run_tool(&config.build, &self.toolchain.source_build_command(tree), Some(distribution))
            .await?;
        let dsc = dsc_path(parent, &metadata.name, version);
        let changes = changes_path(parent, &metadata.name, version);
        debug!("Source package artifacts: {} {}", dsc.display(), changes.display());
        record.artifacts.push(dsc.clone());
        record.artifacts.push(changes.clone());
        self.advance(record, DistributionState::SourcePackageBuilt);

        if self.options.chroot {
            self.run_tool(
                &config.chroot,
                &self.toolchain.chroot_command(distribution, &dsc),
                Some(distribution),
            )
            .await?;
            info!(
                "Binary packages for {distribution} are in {}",
                config.build_result_dir.display()
            );
            record.artifacts.push(config.build_result_dir.clone());
            self.advance(record, DistributionState::ChrootBuilt);
        }

        if self.options.no_upload {
            debug!("Upload suppressed for {distribution}");
        } else {
            self.run_tool(
                &config.upload,
                &self.toolchain.upload_command(&metadata.archive, &changes),
                Some(distribution),
            )
            .await?;
            info!("Uploaded {} to {}", changes.display(), metadata.archive);
            self.advance(record, DistributionState::Uploaded);
        }

        Ok(())
    }

    fn advance(&self, record: &mut DistributionBuildRecord, state: DistributionState) {
        record.advance(state);
        self.progress.state_changed(record.distribution, state);
    }

    async fn run_tool(
        &self,
        tool: &str,
        invocation: &ToolInvocation,
        distribution: Option<Distribution>,
    ) -> Result<ToolOutput> {
        debug!("Invoking {tool}: {invocation}");
        let output = self.runner.run(invocation).await?;
        if !output.success {
            return Err(BuildError::build_tool(
                tool,
                distribution.map(|d| d.to_string()),
                output.failure_reason(),
            ));
        }
        Ok(output)
    }
}

/// Absolute source tree and the directory receiving its artifacts
fn resolve_source_tree(source_tree: &Path) -> Result<(PathBuf, PathBuf)> {
    if !source_tree.is_dir() {
        return Err(BuildError::invalid_source_tree(source_tree, "not a directory"));
    }
    let tree = source_tree.canonicalize()?;
    let parent = tree
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| BuildError::invalid_source_tree(&tree, "has no parent directory"))?;
    Ok((tree, parent))
}
