//! Recording tool runner shared by the build integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use debrelease_build::{Result, ToolInvocation, ToolOutput, ToolRunner};
use debrelease_config::RawConfig;

/// One recorded tool call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub invocation: ToolInvocation,
    /// First changelog line at the moment a source build started
    pub changelog_top: Option<String>,
}

/// Mock runner: the skeleton tool writes a realistic skeleton, every other
/// tool succeeds unless told to fail
#[derive(Default)]
pub struct MockToolRunner {
    calls: Mutex<Vec<RecordedCall>>,
    missing: Vec<String>,
    /// Codenames whose source build exits non-zero
    failing_distributions: Vec<String>,
}

impl MockToolRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn without(programs: &[&str]) -> Arc<Self> {
        Arc::new(Self { missing: programs.iter().map(|p| p.to_string()).collect(), ..Default::default() })
    }

    pub fn failing_for(distributions: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing_distributions: distributions.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls made to `program`
    pub fn calls_to(&self, program: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.invocation.program == program)
            .collect()
    }

    /// Changelog top lines seen by each source build, in order
    pub fn built_headers(&self) -> Vec<String> {
        self.calls_to("debuild")
            .into_iter()
            .filter_map(|c| c.changelog_top)
            .collect()
    }
}

#[async_trait]
impl ToolRunner for MockToolRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing.iter().any(|m| m == program) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(program))
        }
    }

    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let cwd = invocation.cwd.clone().unwrap_or_default();
        let mut changelog_top = None;
        let mut output = ToolOutput::ok();

        match invocation.program.as_str() {
            "dh_make" => {
                let package = argument_after(invocation, "--packagename").unwrap_or_default();
                let (name, version) = package.split_once('_').unwrap_or((package.as_str(), "0"));
                write_skeleton(&cwd, name, version);
            }
            "debuild" => {
                let changelog = std::fs::read_to_string(cwd.join("debian/changelog")).unwrap();
                let top = changelog.lines().next().unwrap_or_default().to_string();
                if self
                    .failing_distributions
                    .iter()
                    .any(|d| top.contains(&format!(") {d};")))
                {
                    output = ToolOutput::failed(2, "dpkg-source: error: unrepresentable changes");
                }
                changelog_top = Some(top);
            }
            _ => {}
        }

        self.calls.lock().unwrap().push(RecordedCall {
            invocation: invocation.clone(),
            changelog_top,
        });
        Ok(output)
    }
}

fn argument_after(invocation: &ToolInvocation, flag: &str) -> Option<String> {
    let index = invocation.args.iter().position(|a| a == flag)?;
    invocation.args.get(index + 1).cloned()
}

/// Skeleton in the shape dh_make leaves it
pub fn write_skeleton(tree: &Path, name: &str, version: &str) {
    let debian = tree.join("debian");
    std::fs::create_dir_all(&debian).unwrap();
    std::fs::write(
        debian.join("control"),
        format!(
            "Source: {name}
Section: unknown
Priority: optional
Maintainer: debrelease <packager@example.org>
Build-Depends: debhelper-compat (= 13)
Standards-Version: 4.6.2
Homepage: <insert the upstream URL, if relevant>
#Vcs-Browser: https://salsa.debian.org/debian/{name}
#Vcs-Git: https://salsa.debian.org/debian/{name}.git
Rules-Requires-Root: no

Package: {name}
Architecture: any
Depends: ${{shlibs:Depends}}, ${{misc:Depends}}
Description: <insert up to 60 chars description>
 <insert long description, indented with spaces>
"
        ),
    )
    .unwrap();
    std::fs::write(
        debian.join("rules"),
        "#!/usr/bin/make -f\n#export DH_VERBOSE = 1\n\n%:\n\tdh $@\n",
    )
    .unwrap();
    std::fs::write(
        debian.join("changelog"),
        format!(
            "{name} ({version}-1) UNRELEASED; urgency=medium\n\n  * Initial release (Closes: \
             #nnnn)  <nnnn is the bug number of your ITP>\n\n -- debrelease \
             <packager@example.org>  Mon, 19 Oct 2026 10:00:00 +0000\n"
        ),
    )
    .unwrap();
}

/// Settings for the `foo` test package
pub fn raw_config(version: &str, distributions: &str) -> RawConfig {
    RawConfig::from_pairs([
        ("name", "foo"),
        ("version", version),
        ("revision", "sav1"),
        ("copyright", "mit"),
        ("archive", "ppa:example/foo"),
        ("email", "packager@example.org"),
        ("description", "Foo interpreter"),
        ("homepage", "https://foo.example.org"),
        ("distributions", distributions),
    ])
    .unwrap()
}

/// `<root>/foo-<version>` with a file in it
pub fn source_tree(root: &Path, version: &str) -> PathBuf {
    let tree = root.join(format!("foo-{version}"));
    std::fs::create_dir_all(&tree).unwrap();
    std::fs::write(tree.join("main.c"), "int main(void) { return 0; }\n").unwrap();
    tree
}
