//! External Debian tooling
//!
//! Every external program goes through [`ToolRunner`] so orchestration can
//! be exercised without dh_make, debuild, pbuilder or dput installed.
//! [`Toolchain`] knows the command lines; the runner only executes them.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use debrelease_config::{BuildOptions, ToolchainConfig};
use debrelease_core::{BuildVersion, Distribution, PackageMetadata};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{BuildError, Result};

/// Lines of tool stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 20;

/// debuild flags for a source-only build: skip the orig tarball check,
/// skip lintian and build dependency checks, fast compression, and ignore
/// VCS noise.
pub const DEBUILD_SOURCE_ARGS: [&str; 7] = [
    "--no-tgz-check",
    "--no-lintian",
    "-d",
    "-S",
    "-z1",
    "-i^$",
    "-I.debrelease-keep-all",
];

/// One external program call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: None, env: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit information of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    /// Exit code, absent when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// A successful run with no output
    pub fn ok() -> Self {
        Self { success: true, code: Some(0), ..Default::default() }
    }

    /// A failed run with exit code `code`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self { success: false, code: Some(code), stderr: stderr.into(), ..Default::default() }
    }

    /// Human readable failure reason
    pub fn failure_reason(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        };
        let lines: Vec<&str> = self.stderr.lines().collect();
        let tail = &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..];
        if tail.is_empty() {
            status
        } else {
            format!("{status}\n{}", tail.join("\n"))
        }
    }
}

/// Executes external programs
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Resolve `program` on the search path
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run to completion. An error means the program could not be started;
    /// a non-zero exit is reported through [`ToolOutput::success`].
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// Runs tools as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessToolRunner;

impl ProcessToolRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for ProcessToolRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        debug!("Running: {invocation}");
        let output = cmd.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BuildError::toolchain_missing(&invocation.program),
            _ => BuildError::Io(e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        for line in stdout.lines() {
            debug!(target: "debrelease::tool", "{}: {line}", invocation.program);
        }

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout,
            stderr,
        })
    }
}

/// Command lines for the configured tools
#[derive(Debug, Clone)]
pub struct Toolchain {
    config: ToolchainConfig,
}

impl Toolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// Programs a run with `options` needs. The skeleton tool is only
    /// required when `generate_skeleton` is set.
    pub fn required_programs(&self, options: &BuildOptions, generate_skeleton: bool) -> Vec<&str> {
        let mut programs = Vec::new();
        if generate_skeleton {
            programs.push(self.config.skeleton.as_str());
        }
        programs.push(self.config.build.as_str());
        if options.chroot {
            programs.push(self.config.sudo.as_str());
            programs.push(self.config.chroot.as_str());
        }
        if !options.no_upload {
            programs.push(self.config.upload.as_str());
        }
        programs
    }

    /// Programs from [`Self::required_programs`] that cannot be found
    pub fn missing_programs(
        &self,
        runner: &dyn ToolRunner,
        options: &BuildOptions,
        generate_skeleton: bool,
    ) -> Vec<String> {
        self.required_programs(options, generate_skeleton)
            .into_iter()
            .filter(|program| runner.locate(program).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Fail with the first missing program
    pub fn ensure_available(
        &self,
        runner: &dyn ToolRunner,
        options: &BuildOptions,
        generate_skeleton: bool,
    ) -> Result<()> {
        match self.missing_programs(runner, options, generate_skeleton).into_iter().next() {
            Some(tool) => Err(BuildError::toolchain_missing(tool)),
            None => {
                info!("Toolchain available");
                Ok(())
            }
        }
    }

    /// Skeleton generation inside the source tree
    pub fn skeleton_command(&self, metadata: &PackageMetadata, source_tree: &Path) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(&self.config.skeleton)
            .args(["--yes", "--single"])
            .arg("--packagename")
            .arg(format!("{}_{}", metadata.name, metadata.upstream_version))
            .arg("--email")
            .arg(&metadata.maintainer_email)
            .arg("--copyright")
            .arg(metadata.copyright.license_arg());
        if let Some(path) = metadata.copyright.custom_file() {
            invocation = invocation.arg("--copyrightfile").arg(path.display().to_string());
        }
        invocation
            .arg("--createorig")
            .current_dir(source_tree)
            .env("DEBFULLNAME", &metadata.maintainer_name)
            .env("DEBEMAIL", &metadata.maintainer_email)
    }

    /// Source package build inside the source tree
    pub fn source_build_command(&self, source_tree: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.config.build)
            .args(DEBUILD_SOURCE_ARGS)
            .current_dir(source_tree)
    }

    /// Binary build of `dsc` in the distribution's chroot
    pub fn chroot_command(&self, distribution: Distribution, dsc: &Path) -> ToolInvocation {
        let base = self
            .config
            .chroot_base_dir
            .join(format!("{}-base.tgz", distribution.codename()));
        ToolInvocation::new(&self.config.sudo)
            .arg(&self.config.chroot)
            .arg("build")
            .arg("--basetgz")
            .arg(base.display().to_string())
            .arg("--distribution")
            .arg(distribution.codename())
            .arg("--buildresult")
            .arg(self.config.build_result_dir.display().to_string())
            .arg(dsc.display().to_string())
    }

    /// Upload of `changes` to `archive`
    pub fn upload_command(&self, archive: &str, changes: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.config.upload)
            .arg(archive)
            .arg(changes.display().to_string())
    }

    /// Non-interactive refresh of cached sudo credentials
    pub fn privilege_refresh_command(&self) -> ToolInvocation {
        ToolInvocation::new(&self.config.sudo).args(["-n", "-v"])
    }
}

/// `<parent>/<name>_<fileversion>.dsc`
pub fn dsc_path(parent: &Path, name: &str, version: &BuildVersion) -> PathBuf {
    parent.join(format!("{name}_{}.dsc", version.file_version()))
}

/// `<parent>/<name>_<fileversion>_source.changes`
pub fn changes_path(parent: &Path, name: &str, version: &BuildVersion) -> PathBuf {
    parent.join(format!("{name}_{}_source.changes", version.file_version()))
}

/// Whether a run over `source_tree` has to generate a skeleton first
pub fn needs_skeleton(options: &BuildOptions, source_tree: &Path) -> bool {
    !(options.reuse_existing_skeleton && source_tree.join("debian").is_dir())
}

#[cfg(test)]
mod tests {
    use debrelease_core::{Copyright, License};

    use super::*;

    fn metadata() -> PackageMetadata {
        PackageMetadata {
            name: "foo".to_string(),
            upstream_version: "1.0".to_string(),
            revision: "1".to_string(),
            copyright: Copyright::License(License::Gpl3),
            archive: "ppa:example/foo".to_string(),
            maintainer_email: "p@example.org".to_string(),
            maintainer_name: "Packager".to_string(),
            description: "Foo".to_string(),
            long_description: " Foo".to_string(),
            homepage: "https://example.org".to_string(),
            section: "misc".to_string(),
            vcs_browser: None,
            vcs_git: None,
            build_depends: Vec::new(),
            depends: Vec::new(),
            distributions: vec![Distribution::Focal],
        }
    }

    #[test]
    fn test_skeleton_command() {
        let toolchain = Toolchain::new(ToolchainConfig::default());
        let cmd = toolchain.skeleton_command(&metadata(), Path::new("/src/foo-1.0"));

        assert_eq!(cmd.program, "dh_make");
        assert_eq!(
            cmd.to_string(),
            "dh_make --yes --single --packagename foo_1.0 --email p@example.org --copyright \
             gpl3 --createorig"
        );
        assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/src/foo-1.0")));
        assert!(cmd.env.contains(&("DEBFULLNAME".to_string(), "Packager".to_string())));
    }

    #[test]
    fn test_chroot_command() {
        let toolchain = Toolchain::new(ToolchainConfig::default());
        let cmd = toolchain.chroot_command(Distribution::Jammy, Path::new("/src/foo_1.0-1~jammy1.dsc"));
        assert_eq!(
            cmd.to_string(),
            "sudo pbuilder build --basetgz /var/cache/pbuilder/jammy-base.tgz --distribution \
             jammy --buildresult /var/cache/pbuilder/result /src/foo_1.0-1~jammy1.dsc"
        );
    }

    #[test]
    fn test_artifact_paths() {
        let version = BuildVersion::assign(&metadata(), Distribution::Focal, 1);
        assert_eq!(
            dsc_path(Path::new("/src"), "foo", &version),
            PathBuf::from("/src/foo_1.0-1~focal1.dsc")
        );
        assert_eq!(
            changes_path(Path::new("/src"), "foo", &version),
            PathBuf::from("/src/foo_1.0-1~focal1_source.changes")
        );
    }

    #[test]
    fn test_required_programs() {
        let toolchain = Toolchain::new(ToolchainConfig::default());
        let mut options = BuildOptions::default();
        assert_eq!(
            toolchain.required_programs(&options, true),
            vec!["dh_make", "debuild", "dput"]
        );

        options.chroot = true;
        options.no_upload = true;
        assert_eq!(
            toolchain.required_programs(&options, true),
            vec!["dh_make", "debuild", "sudo", "pbuilder"]
        );
        assert_eq!(
            toolchain.required_programs(&options, false),
            vec!["debuild", "sudo", "pbuilder"]
        );
    }

    #[test]
    fn test_needs_skeleton() {
        let tree = tempfile::TempDir::new().unwrap();
        let mut options = BuildOptions::default();
        assert!(needs_skeleton(&options, tree.path()));

        std::fs::create_dir(tree.path().join("debian")).unwrap();
        assert!(needs_skeleton(&options, tree.path()));

        options.reuse_existing_skeleton = true;
        assert!(!needs_skeleton(&options, tree.path()));
    }

    #[test]
    fn test_failure_reason_keeps_stderr_tail() {
        let stderr: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let reason = ToolOutput::failed(2, stderr).failure_reason();
        assert!(reason.starts_with("exited with status 2\nline 10"));
        assert!(reason.ends_with("line 29"));
    }
}
