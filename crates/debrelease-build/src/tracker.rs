//! Marker files for upstream versions that were already packaged

use std::path::{Path, PathBuf};

use debrelease_core::Error;
use tracing::{debug, info};

use crate::error::{BuildError, Result};

/// Records packaged upstream versions as empty files in one directory
#[derive(Debug, Clone)]
pub struct VersionTracker {
    dir: PathBuf,
}

impl VersionTracker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Verify the directory exists and accepts new files
    pub fn ensure_ready(&self) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(BuildError::tracking_directory(&self.dir, "not a directory"));
        }
        tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| BuildError::tracking_directory(&self.dir, format!("not writable: {e}")))?;
        debug!("Tracking directory {} is ready", self.dir.display());
        Ok(())
    }

    fn marker(&self, version: &str) -> Result<PathBuf> {
        let valid = !version.is_empty()
            && version != "."
            && version != ".."
            && !version.contains(['/', '\\']);
        if !valid {
            return Err(Error::config(format!("'{version}' cannot be used as a tracked version")).into());
        }
        Ok(self.dir.join(version))
    }

    /// Whether a marker exists for `version`
    pub fn is_packaged(&self, version: &str) -> Result<bool> {
        Ok(self.marker(version)?.is_file())
    }

    /// Create the marker for `version`
    pub fn mark_packaged(&self, version: &str) -> Result<PathBuf> {
        let path = self.marker(version)?;
        std::fs::write(&path, b"")?;
        info!("Marked {version} as packaged");
        Ok(path)
    }

    /// Every tracked version, sorted
    pub fn packaged_versions(&self) -> Result<Vec<String>> {
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    // tempfile probes start with ".tmp"
                    if !name.starts_with('.') {
                        versions.push(name.to_string());
                    }
                }
            }
        }
        versions.sort();
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_mark_and_query() {
        let dir = TempDir::new().unwrap();
        let tracker = VersionTracker::new(dir.path());
        tracker.ensure_ready().unwrap();

        assert!(!tracker.is_packaged("2.7.1").unwrap());
        let marker = tracker.mark_packaged("2.7.1").unwrap();
        assert!(tracker.is_packaged("2.7.1").unwrap());
        assert_eq!(std::fs::metadata(marker).unwrap().len(), 0);
        assert_eq!(tracker.packaged_versions().unwrap(), vec!["2.7.1"]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let tracker = VersionTracker::new(dir.path().join("absent"));
        assert!(matches!(
            tracker.ensure_ready(),
            Err(BuildError::TrackingDirectory { .. })
        ));
    }

    #[test]
    fn test_rejects_path_like_versions() {
        let dir = TempDir::new().unwrap();
        let tracker = VersionTracker::new(dir.path());
        for version in ["", "..", "1.0/../../etc", "a\\b"] {
            let err = tracker.is_packaged(version).unwrap_err();
            assert!(err.is_configuration(), "{version:?} accepted");
        }
    }
}
