//! Release automation tests

mod common;

use std::sync::Arc;

use common::{raw_config, source_tree, MockToolRunner};
use debrelease_build::{
    BuildError, BuildOrchestrator, ManifestReleaseSource, ReleaseAutomation, ReleaseOutcome,
    UpstreamRelease, VersionTracker,
};
use debrelease_config::{BuildOptions, ToolchainConfig};
use tempfile::TempDir;

struct Fixture {
    root: TempDir,
    tracking: TempDir,
    work: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            tracking: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
        }
    }

    fn options(&self) -> BuildOptions {
        BuildOptions {
            no_upload: true,
            work_dir: self.work.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn release(&self, version: &str) -> UpstreamRelease {
        UpstreamRelease { version: version.to_string(), location: source_tree(self.root.path(), version) }
    }

    fn automation(&self, runner: Arc<MockToolRunner>) -> ReleaseAutomation {
        self.automation_for(runner, "focal")
    }

    fn automation_for(&self, runner: Arc<MockToolRunner>, distributions: &str) -> ReleaseAutomation {
        let orchestrator = BuildOrchestrator::new(runner, ToolchainConfig::default(), self.options());
        ReleaseAutomation::new(
            raw_config("0.0", distributions),
            orchestrator,
            VersionTracker::new(self.tracking.path()),
        )
    }
}

#[tokio::test]
async fn test_tracked_release_is_skipped() {
    let fixture = Fixture::new();
    std::fs::write(fixture.tracking.path().join("2.7.1"), "").unwrap();
    let releases = vec![fixture.release("2.7.1"), fixture.release("2.7.2")];
    let runner = MockToolRunner::new();

    let results = fixture.automation(runner.clone()).run(&releases).await.unwrap();

    assert!(matches!(results[0].outcome, ReleaseOutcome::Skipped));
    match &results[1].outcome {
        ReleaseOutcome::Packaged(report) => assert_eq!(report.upstream_version, "2.7.2"),
        other => panic!("unexpected outcome {other:?}"),
    }

    let skeletons = runner.calls_to("dh_make");
    assert_eq!(skeletons.len(), 1);
    assert!(skeletons[0].invocation.args.contains(&"foo_2.7.2".to_string()));
    assert_eq!(runner.built_headers(), vec!["foo (2.7.2-sav1~focal1) focal; urgency=medium"]);

    assert!(!releases[0].location.join("debian").exists());
    assert!(fixture.tracking.path().join("2.7.2").is_file());
}

#[tokio::test]
async fn test_second_run_does_nothing() {
    let fixture = Fixture::new();
    let releases = vec![fixture.release("1.0"), fixture.release("1.1")];

    let first = MockToolRunner::new();
    fixture.automation(first.clone()).run(&releases).await.unwrap();
    assert_eq!(first.calls_to("debuild").len(), 2);

    let second = MockToolRunner::new();
    let results = fixture.automation(second.clone()).run(&releases).await.unwrap();
    assert!(results.iter().all(|r| matches!(r.outcome, ReleaseOutcome::Skipped)));
    assert!(second.calls().is_empty());
}

#[tokio::test]
async fn test_failed_release_leaves_no_marker() {
    let fixture = Fixture::new();
    let releases = vec![fixture.release("3.0"), fixture.release("3.1")];
    let runner = MockToolRunner::failing_for(&["focal"]);

    let err = fixture.automation(runner.clone()).run(&releases).await.unwrap_err();

    assert!(matches!(err, BuildError::BuildTool { .. }));
    assert_eq!(runner.calls_to("dh_make").len(), 1);
    let tracker = VersionTracker::new(fixture.tracking.path());
    assert!(!tracker.is_packaged("3.0").unwrap());
    assert!(tracker.packaged_versions().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_release_is_retried_from_scratch() {
    let fixture = Fixture::new();
    let releases = vec![fixture.release("3.0")];

    let failing = MockToolRunner::failing_for(&["focal"]);
    let err = fixture
        .automation_for(failing.clone(), "bionic,focal")
        .run(&releases)
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::BuildTool { .. }));
    assert_eq!(failing.calls_to("debuild").len(), 2);

    let passing = MockToolRunner::new();
    let results = fixture
        .automation_for(passing.clone(), "bionic,focal")
        .run(&releases)
        .await
        .unwrap();

    assert!(matches!(results[0].outcome, ReleaseOutcome::Packaged(_)));
    assert_eq!(passing.calls_to("dh_make").len(), 1);
    assert_eq!(
        passing.built_headers(),
        vec![
            "foo (3.0-sav1~bionic1) bionic; urgency=medium",
            "foo (3.0-sav1~focal1) focal; urgency=medium",
        ]
    );
    assert!(fixture.tracking.path().join("3.0").is_file());
    assert!(!releases[0].location.join("debian").exists());
    assert!(fixture.work.path().join("3.0/foo-3.0/debian/control").is_file());
}

#[tokio::test]
async fn test_unusable_tracking_directory() {
    let fixture = Fixture::new();
    let runner = MockToolRunner::new();
    let orchestrator =
        BuildOrchestrator::new(runner.clone(), ToolchainConfig::default(), fixture.options());
    let automation = ReleaseAutomation::new(
        raw_config("0.0", "focal"),
        orchestrator,
        VersionTracker::new(fixture.tracking.path().join("missing")),
    );

    let err = automation.run(&[fixture.release("1.0")]).await.unwrap_err();
    assert!(matches!(err, BuildError::TrackingDirectory { .. }));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_releases_from_manifest() {
    let fixture = Fixture::new();
    source_tree(fixture.root.path(), "4.0");
    let manifest = fixture.root.path().join("releases.yaml");
    std::fs::write(&manifest, "- version: \"4.0\"\n  location: foo-4.0\n").unwrap();
    let runner = MockToolRunner::new();

    let results = fixture
        .automation(runner.clone())
        .run_from(&ManifestReleaseSource::new(&manifest))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].version, "4.0");
    assert!(fixture.tracking.path().join("4.0").is_file());
}
