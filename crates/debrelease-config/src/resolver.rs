//! Resolution of raw package settings into [`PackageMetadata`]

use std::path::{Path, PathBuf};

use debrelease_core::error::{Error, Result};
use debrelease_core::{Copyright, Distribution, License, PackageMetadata};
use tracing::debug;

use crate::raw::RawConfig;

/// Settings without which no package can be produced
pub const MANDATORY_FIELDS: [&str; 7] =
    ["name", "version", "copyright", "archive", "email", "description", "homepage"];

/// Section used when none is configured
pub const DEFAULT_SECTION: &str = "misc";

/// Packaging revision used when none is configured
pub const DEFAULT_REVISION: &str = "1";

/// Maintainer name used when none is configured
pub const DEFAULT_MAINTAINER: &str = "debrelease";

/// Continuation line standing in for an empty long description line
pub const BLANK_LINE_PLACEHOLDER: &str = " .";

/// Turns [`RawConfig`] into validated [`PackageMetadata`]
#[derive(Debug, Clone, Default)]
pub struct MetadataResolver {
    /// Directory relative copyright paths are resolved against
    base_dir: Option<PathBuf>,
}

impl MetadataResolver {
    /// Create a resolver that resolves relative paths against the cwd
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative copyright paths against `dir`
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Validate and normalize `raw`.
    ///
    /// Performs no writes; a copyright file is only read.
    pub fn resolve(&self, raw: &RawConfig) -> Result<PackageMetadata> {
        for field in MANDATORY_FIELDS {
            mandatory(raw, field)?;
        }

        let name = mandatory(raw, "name")?;
        let description = mandatory(raw, "description")?;

        let build_depends = split_dependencies(raw.get("build_depends"), "build_depends")?;
        let depends = split_dependencies(raw.get("depends"), "depends")?;
        let distributions = parse_distributions(raw.get("distributions"))?;
        let copyright = self.resolve_copyright(mandatory(raw, "copyright")?)?;

        let long_description = normalize_long_description(
            optional(raw, "long_description").unwrap_or(description.as_str()),
        );

        let metadata = PackageMetadata {
            upstream_version: mandatory(raw, "version")?,
            revision: optional(raw, "revision").unwrap_or(DEFAULT_REVISION).to_string(),
            copyright,
            archive: mandatory(raw, "archive")?,
            maintainer_email: mandatory(raw, "email")?,
            maintainer_name: optional(raw, "maintainer").unwrap_or(DEFAULT_MAINTAINER).to_string(),
            long_description,
            homepage: mandatory(raw, "homepage")?,
            section: optional(raw, "section").unwrap_or(DEFAULT_SECTION).to_string(),
            vcs_browser: optional(raw, "vcs_browser").map(str::to_string),
            vcs_git: optional(raw, "vcs_git").map(str::to_string),
            build_depends,
            depends,
            distributions,
            name,
            description,
        };

        debug!(
            "Resolved metadata for {} {} targeting {:?}",
            metadata.name, metadata.upstream_version, metadata.distributions
        );
        Ok(metadata)
    }

    fn resolve_copyright(&self, value: String) -> Result<Copyright> {
        let candidate = match &self.base_dir {
            Some(base) if Path::new(&value).is_relative() => base.join(&value),
            _ => PathBuf::from(&value),
        };

        if candidate.is_file() {
            let text = std::fs::read_to_string(&candidate)?;
            return Ok(Copyright::CustomFile { path: candidate, text });
        }

        value.parse::<License>().map(Copyright::License)
    }
}

fn optional<'a>(raw: &'a RawConfig, field: &str) -> Option<&'a str> {
    raw.get(field).filter(|v| !v.trim().is_empty())
}

fn mandatory(raw: &RawConfig, field: &str) -> Result<String> {
    optional(raw, field)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| Error::missing(field))
}

/// Split a comma separated dependency list into atomic tokens
pub fn split_dependencies(value: Option<&str>, field: &str) -> Result<Vec<String>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    let mut tokens = Vec::new();
    for token in value.split(',') {
        if token.is_empty() {
            continue;
        }
        if token.chars().any(char::is_whitespace) {
            return Err(Error::config(format!(
                "{field} entry '{token}' contains whitespace; separate entries with ',' only"
            )));
        }
        tokens.push(token.to_string());
    }
    Ok(tokens)
}

/// Parse the target distribution list, defaulting to every supported one
pub fn parse_distributions(value: Option<&str>) -> Result<Vec<Distribution>> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(Distribution::ALL.to_vec());
    };

    let mut distributions = Vec::new();
    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let distribution = name.parse::<Distribution>()?;
        if !distributions.contains(&distribution) {
            distributions.push(distribution);
        }
    }

    if distributions.is_empty() {
        return Err(Error::config("distributions must name at least one distribution"));
    }
    Ok(distributions)
}

/// Render a multi-line description as control file continuation lines
pub fn normalize_long_description(text: &str) -> String {
    text.trim_end()
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.trim().is_empty() {
                BLANK_LINE_PLACEHOLDER.to_string()
            } else {
                format!(" {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
