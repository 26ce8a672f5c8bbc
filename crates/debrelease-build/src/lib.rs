//! Build orchestration for debrelease
//!
//! This crate drives the external Debian tooling: it generates the
//! skeleton once per package, retargets it at each distribution in turn,
//! builds the source package, optionally builds binaries in a chroot, and
//! uploads. The release automation wraps that pipeline with version
//! tracking so published releases are never rebuilt.

pub mod automation;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod progress_ui;
pub mod toolchain;
pub mod tracker;
pub mod watchdog;

pub use automation::{
    ExtractedTreePreparer, ManifestReleaseSource, ReleaseAutomation, ReleaseOutcome,
    ReleasePreparer, ReleaseResult, ReleaseSource, UpstreamRelease, summarize,
};
pub use context::{DistributionBuildRecord, DistributionState, RunReport};
pub use debrelease_config::FailurePolicy;
pub use error::{BuildError, Result};
pub use orchestrator::BuildOrchestrator;
pub use progress_ui::{create_progress_ui, IndicatifProgressUI, NoOpProgressUI, ProgressUI};
pub use toolchain::{
    needs_skeleton, ProcessToolRunner, ToolInvocation, ToolOutput, ToolRunner, Toolchain,
};
pub use tracker::VersionTracker;
pub use watchdog::PrivilegeWatchdog;
