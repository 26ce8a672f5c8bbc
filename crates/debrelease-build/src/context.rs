//! Per-distribution build records and the run report

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use debrelease_core::Distribution;
use serde::{Deserialize, Serialize};

/// Where one distribution's build currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionState {
    /// Build version assigned
    VersionAssigned,
    /// Changelog header points at the distribution
    ChangelogRewritten,
    /// debhelper compatibility declared
    CompatibilityResolved,
    /// Source package built
    SourcePackageBuilt,
    /// Binary packages built in the chroot
    ChrootBuilt,
    /// Source package uploaded
    Uploaded,
    /// All requested steps finished
    Done,
    /// A step failed
    Failed,
}

impl DistributionState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Short label for progress output
    pub fn label(&self) -> &'static str {
        match self {
            Self::VersionAssigned => "version assigned",
            Self::ChangelogRewritten => "changelog rewritten",
            Self::CompatibilityResolved => "compat resolved",
            Self::SourcePackageBuilt => "source package built",
            Self::ChrootBuilt => "chroot build finished",
            Self::Uploaded => "uploaded",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one distribution's build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionBuildRecord {
    pub distribution: Distribution,
    /// Assigned build version
    pub version: String,
    pub state: DistributionState,
    /// Last state reached before a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_after: Option<DistributionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Files produced by the build tools
    pub artifacts: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl DistributionBuildRecord {
    /// Start a record once the version has been assigned
    pub fn new(distribution: Distribution, version: impl Into<String>) -> Self {
        Self {
            distribution,
            version: version.into(),
            state: DistributionState::VersionAssigned,
            failed_after: None,
            error: None,
            artifacts: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to `state`
    pub fn advance(&mut self, state: DistributionState) {
        self.state = state;
        if state.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }

    /// Mark the record failed with `error`
    pub fn fail(&mut self, error: impl Into<String>) {
        self.failed_after = Some(self.state);
        self.error = Some(error.into());
        self.advance(DistributionState::Failed);
    }

    pub fn is_success(&self) -> bool {
        self.state == DistributionState::Done
    }

    /// Time spent on this distribution
    pub fn duration(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).to_std().unwrap_or_default()
    }
}

/// Everything one orchestrator run did, in distribution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub package: String,
    pub upstream_version: String,
    pub records: Vec<DistributionBuildRecord>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Empty report for a package
    pub fn new(package: impl Into<String>, upstream_version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            upstream_version: upstream_version.into(),
            records: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Close the report
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Record for a distribution, if it was attempted
    pub fn record(&self, distribution: Distribution) -> Option<&DistributionBuildRecord> {
        self.records.iter().find(|r| r.distribution == distribution)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DistributionBuildRecord> {
        self.records.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DistributionBuildRecord> {
        self.records.iter().filter(|r| r.state == DistributionState::Failed)
    }

    /// Whether every attempted distribution finished
    pub fn is_successful(&self) -> bool {
        self.records.iter().all(DistributionBuildRecord::is_success)
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        let built = self.succeeded().count();
        let failed = self.failed().count();
        let mut summary = format!(
            "{} {}: {} of {} distribution(s) built",
            self.package,
            self.upstream_version,
            built,
            self.records.len()
        );
        if failed > 0 {
            summary.push_str(&format!(", {failed} failed"));
        }
        summary
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
