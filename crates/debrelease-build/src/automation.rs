//! Unattended packaging of upstream releases
//!
//! A [`ReleaseSource`] lists releases, a [`ReleasePreparer`] turns each into
//! a source tree, and the [`VersionTracker`] makes the whole loop safe to
//! run repeatedly: a version is marked only after every distribution
//! built, so a failed release is retried on the next run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use debrelease_config::{MetadataResolver, RawConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::context::RunReport;
use crate::error::{BuildError, Result};
use crate::orchestrator::BuildOrchestrator;
use crate::tracker::VersionTracker;

/// One upstream release and where its sources live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamRelease {
    pub version: String,
    pub location: PathBuf,
}

/// Lists candidate releases, oldest first
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn releases(&self) -> Result<Vec<UpstreamRelease>>;
}

/// Makes a release's source tree available for packaging
#[async_trait]
pub trait ReleasePreparer: Send + Sync {
    /// Return the source tree to package
    async fn prepare(&self, release: &UpstreamRelease) -> Result<PathBuf>;
}

/// Releases listed in a YAML file:
///
/// ```yaml
/// - version: 2.7.1
///   location: /srv/src/tool-2.7.1
/// ```
///
/// Relative locations are resolved against the manifest's directory.
#[derive(Debug, Clone)]
pub struct ManifestReleaseSource {
    path: PathBuf,
}

impl ManifestReleaseSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse manifest text; relative locations are joined onto `base_dir`
    pub fn parse(content: &str, base_dir: &Path) -> Result<Vec<UpstreamRelease>> {
        let releases: Vec<UpstreamRelease> = serde_yaml::from_str(content)
            .map_err(|e| BuildError::ReleaseList { reason: e.to_string() })?;

        Ok(releases
            .into_iter()
            .map(|mut release| {
                if release.location.is_relative() {
                    release.location = base_dir.join(&release.location);
                }
                release
            })
            .collect())
    }
}

#[async_trait]
impl ReleaseSource for ManifestReleaseSource {
    async fn releases(&self) -> Result<Vec<UpstreamRelease>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            BuildError::ReleaseList { reason: format!("{}: {e}", self.path.display()) }
        })?;
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base_dir)
    }
}

/// Stages a fresh copy of each extracted release under a work directory.
///
/// Every attempt starts from `<work_dir>/<version>/<tree name>`, discarding
/// whatever an earlier unmarked attempt left there, so a failed release is
/// retried from a pristine tree. The release location itself is never
/// modified. Build artifacts land next to the copy.
#[derive(Debug, Clone)]
pub struct ExtractedTreePreparer {
    work_dir: PathBuf,
}

impl ExtractedTreePreparer {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self { work_dir: work_dir.into() }
    }

    /// Directory holding the attempt for `version`
    pub fn attempt_dir(&self, version: &str) -> PathBuf {
        self.work_dir.join(version)
    }
}

#[async_trait]
impl ReleasePreparer for ExtractedTreePreparer {
    async fn prepare(&self, release: &UpstreamRelease) -> Result<PathBuf> {
        if !release.location.is_dir() {
            return Err(BuildError::invalid_source_tree(
                &release.location,
                format!("source tree for {} not found", release.version),
            ));
        }
        let name = release.location.file_name().ok_or_else(|| {
            BuildError::invalid_source_tree(&release.location, "has no directory name")
        })?;

        let attempt = self.attempt_dir(&release.version);
        if attempt.exists() {
            info!("Discarding previous attempt in {}", attempt.display());
            std::fs::remove_dir_all(&attempt)?;
        }

        let tree = attempt.join(name);
        copy_tree(&release.location, &tree)?;
        debug!("Staged {} in {}", release.location.display(), tree.display());
        Ok(tree)
    }
}

/// Copy `source` to `target`, keeping symlinks as links
fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| BuildError::invalid_source_tree(entry.path(), e.to_string()))?;
        let target_path = target.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&target_path)?;
        } else if file_type.is_symlink() {
            std::os::unix::fs::symlink(std::fs::read_link(entry.path())?, &target_path)?;
        } else {
            std::fs::copy(entry.path(), &target_path)?;
        }
    }
    Ok(())
}

/// What happened to one release
#[derive(Debug, Clone)]
pub enum ReleaseOutcome {
    /// Built for every distribution and marked
    Packaged(RunReport),
    /// A marker already existed
    Skipped,
}

/// Outcome of one release in an automation run
#[derive(Debug, Clone)]
pub struct ReleaseResult {
    pub version: String,
    pub outcome: ReleaseOutcome,
}

/// Packages every untracked release through one orchestrator
pub struct ReleaseAutomation {
    base: RawConfig,
    resolver: MetadataResolver,
    orchestrator: BuildOrchestrator,
    tracker: VersionTracker,
    preparer: Arc<dyn ReleasePreparer>,
}

impl ReleaseAutomation {
    /// Stages releases under the orchestrator's `work_dir` unless another
    /// preparer is set
    pub fn new(base: RawConfig, orchestrator: BuildOrchestrator, tracker: VersionTracker) -> Self {
        let preparer = Arc::new(ExtractedTreePreparer::new(&orchestrator.options().work_dir));
        Self {
            base,
            resolver: MetadataResolver::new(),
            orchestrator,
            tracker,
            preparer,
        }
    }

    pub fn with_resolver(mut self, resolver: MetadataResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_preparer(mut self, preparer: Arc<dyn ReleasePreparer>) -> Self {
        self.preparer = preparer;
        self
    }

    pub fn tracker(&self) -> &VersionTracker {
        &self.tracker
    }

    /// Read the source's releases and package them
    pub async fn run_from(&self, source: &dyn ReleaseSource) -> Result<Vec<ReleaseResult>> {
        let releases = source.releases().await?;
        self.run(&releases).await
    }

    /// Package each release in order, stopping at the first failure
    pub async fn run(&self, releases: &[UpstreamRelease]) -> Result<Vec<ReleaseResult>> {
        self.tracker.ensure_ready()?;
        info!("Checking {} release(s)", releases.len());

        let mut results = Vec::with_capacity(releases.len());
        for release in releases {
            let outcome = self.process(release).await.map_err(|e| {
                warn!("Release {} failed: {e}", release.version);
                e
            })?;
            results.push(ReleaseResult { version: release.version.clone(), outcome });
        }
        Ok(results)
    }

    async fn process(&self, release: &UpstreamRelease) -> Result<ReleaseOutcome> {
        if self.tracker.is_packaged(&release.version)? {
            info!("{} already packaged, skipping", release.version);
            return Ok(ReleaseOutcome::Skipped);
        }

        let mut raw = self.base.clone();
        raw.set("version", &release.version)?;
        let metadata = self.resolver.resolve(&raw)?;

        let tree = self.preparer.prepare(release).await?;
        info!("Packaging {} {} from {}", metadata.name, release.version, tree.display());
        let report = self.orchestrator.run(&metadata, &tree).await?;

        self.tracker.mark_packaged(&release.version)?;
        Ok(ReleaseOutcome::Packaged(report))
    }
}

/// Counts for the end-of-run summary
pub fn summarize(results: &[ReleaseResult]) -> (usize, usize) {
    let packaged = results
        .iter()
        .filter(|r| matches!(r.outcome, ReleaseOutcome::Packaged(_)))
        .count();
    (packaged, results.len() - packaged)
}
