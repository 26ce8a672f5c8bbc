//! Population of a `dh_make` skeleton from package metadata

use std::path::{Path, PathBuf};

use debrelease_core::{BuildVersion, PackageMetadata};
use regex::Regex;
use tracing::{debug, info};

use crate::changelog::{rewrite_top_header, ChangelogHeader};
use crate::compat::CompatibilityDescriptor;
use crate::edit::{Anchor, AnchoredText};
use crate::error::{DebianError, Result};

/// Changelog item the skeleton generator leaves behind
pub const CHANGELOG_PLACEHOLDER: &str = "Initial release (Closes: #nnnn)";

/// Item written in its place
pub const UPSTREAM_RELEASE_ENTRY: &str = "  * New upstream release.";

const SECTION_PLACEHOLDER: &str = "Section: unknown";
const HOMEPAGE_PLACEHOLDER: &str = "Homepage: <insert the upstream URL, if relevant>";
const DESCRIPTION_PLACEHOLDER: &str = "Description: <insert up to 60 chars description>";
const LONG_DESCRIPTION_PLACEHOLDER: &str = " <insert long description, indented with spaces>";
const VCS_BROWSER_DIRECTIVE: &str = "#Vcs-Browser:";
const VCS_GIT_DIRECTIVE: &str = "#Vcs-Git:";
const VERBOSE_DIRECTIVE: &str = "#export DH_VERBOSE = 1";

/// Skips strip-nondeterminism, which chokes on already compressed payloads
pub const STRIP_NONDETERMINISM_OVERRIDE: &str = "override_dh_strip_nondeterminism:";

/// Turns the test target into a no-op
pub const AUTO_TEST_OVERRIDE: &str = "override_dh_auto_test:";

/// Skeleton edits that depend on run toggles rather than metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Let `dh_auto_test` run during builds
    pub run_tests: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self { run_tests: true }
    }
}

/// Edits the `debian/` directory of one source tree in place
#[derive(Debug, Clone)]
pub struct ControlFileTemplater {
    debian_dir: PathBuf,
}

impl ControlFileTemplater {
    /// Templater for `<source_tree>/debian`
    pub fn new(source_tree: &Path) -> Self {
        Self { debian_dir: source_tree.join("debian") }
    }

    fn read(&self, name: &str) -> Result<AnchoredText> {
        let path = self.debian_dir.join(name);
        if !path.is_file() {
            return Err(DebianError::missing_file(path.display().to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(AnchoredText::new(format!("debian/{name}"), &content))
    }

    fn write(&self, name: &str, text: AnchoredText) -> Result<()> {
        std::fs::write(self.debian_dir.join(name), text.into_string())?;
        Ok(())
    }

    /// Populate changelog, control and rules from `metadata`.
    ///
    /// All three files are edited in memory first; nothing is written unless
    /// every anchor was found.
    pub fn apply_metadata(&self, metadata: &PackageMetadata, options: &TemplateOptions) -> Result<()> {
        info!("Populating {} from metadata", self.debian_dir.display());

        let mut changelog = self.read("changelog")?;
        changelog.replace_line(Anchor::Contains(CHANGELOG_PLACEHOLDER), UPSTREAM_RELEASE_ENTRY)?;

        let mut control = self.read("control")?;
        Self::edit_control(&mut control, metadata)?;

        let mut rules = self.read("rules")?;
        Self::edit_rules(&mut rules, options)?;

        self.write("changelog", changelog)?;
        self.write("control", control)?;
        self.write("rules", rules)?;

        debug!("Skeleton populated for {}", metadata.name);
        Ok(())
    }

    fn edit_control(control: &mut AnchoredText, metadata: &PackageMetadata) -> Result<()> {
        control.append_to_field("Build-Depends", &metadata.build_depends)?;
        control.append_to_field("Depends", &metadata.depends)?;

        control.replace_line(
            Anchor::Exact(SECTION_PLACEHOLDER),
            &format!("Section: {}", metadata.section),
        )?;
        control.replace_line(
            Anchor::Exact(HOMEPAGE_PLACEHOLDER),
            &format!("Homepage: {}", metadata.homepage),
        )?;
        control.replace_line(
            Anchor::Exact(DESCRIPTION_PLACEHOLDER),
            &format!("Description: {}", metadata.description),
        )?;
        control.replace_line(
            Anchor::Exact(LONG_DESCRIPTION_PLACEHOLDER),
            &metadata.long_description,
        )?;

        if let Some(url) = &metadata.vcs_browser {
            control.replace_line(Anchor::Prefix(VCS_BROWSER_DIRECTIVE), &format!("Vcs-Browser: {url}"))?;
        }
        if let Some(url) = &metadata.vcs_git {
            control.replace_line(Anchor::Prefix(VCS_GIT_DIRECTIVE), &format!("Vcs-Git: {url}"))?;
        }

        Ok(())
    }

    fn edit_rules(rules: &mut AnchoredText, options: &TemplateOptions) -> Result<()> {
        rules.replace_line(Anchor::Exact(VERBOSE_DIRECTIVE), "export DH_VERBOSE = 1")?;

        rules.append_block_once(STRIP_NONDETERMINISM_OVERRIDE, STRIP_NONDETERMINISM_OVERRIDE);
        if !options.run_tests {
            rules.append_block_once(AUTO_TEST_OVERRIDE, AUTO_TEST_OVERRIDE);
        }

        Ok(())
    }

    /// Point the top changelog entry at `version` and its distribution
    pub fn rewrite_changelog(
        &self,
        metadata: &PackageMetadata,
        version: &BuildVersion,
        urgency: &str,
    ) -> Result<ChangelogHeader> {
        let path = self.debian_dir.join("changelog");
        if !path.is_file() {
            return Err(DebianError::missing_file(path.display().to_string()));
        }
        let content = std::fs::read_to_string(&path)?;

        let header = ChangelogHeader {
            source: metadata.name.clone(),
            version: version.to_string(),
            distribution: version.distribution.to_string(),
            urgency: urgency.to_string(),
        };
        std::fs::write(&path, rewrite_top_header("debian/changelog", &content, &header)?)?;

        debug!("Changelog now targets {}", header);
        Ok(header)
    }

    /// Declare the descriptor's compatibility level in control (and compat)
    pub fn apply_compat(&self, descriptor: &CompatibilityDescriptor) -> Result<()> {
        let token = Regex::new(r"debhelper-compat \(= \d+\)|debhelper \(>= [^)]*\)")
            .expect("Valid regex");

        let mut control = self.read("control")?;
        control.replace_token(&token, &descriptor.dependency, "debhelper-compat (= N)")?;
        self.write("control", control)?;

        let compat_path = self.debian_dir.join("compat");
        if descriptor.write_compat_file {
            std::fs::write(&compat_path, format!("{}\n", descriptor.level))?;
        } else if compat_path.exists() {
            // debhelper refuses a compat file next to debhelper-compat
            std::fs::remove_file(&compat_path)?;
        }

        debug!(
            "Declared debhelper compat {} for {} via {}",
            descriptor.level, descriptor.distribution, descriptor.dependency
        );
        Ok(())
    }
}
