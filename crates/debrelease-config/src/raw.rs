//! Flat, unvalidated package settings

use debrelease_core::error::{Error, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Package settings exactly as configured.
///
/// Every value is an optional string; list-valued settings are comma
/// separated. Nothing here is validated, that is the resolver's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "quoted_value", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "quoted_value", skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub vcs_browser: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub vcs_git: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub build_depends: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub depends: Option<String>,
    #[serde(default, deserialize_with = "flat_value", skip_serializing_if = "Option::is_none")]
    pub distributions: Option<String>,
}

impl RawConfig {
    /// Every recognised key
    pub const KEYS: [&'static str; 16] = [
        "name",
        "version",
        "revision",
        "copyright",
        "archive",
        "email",
        "maintainer",
        "description",
        "long_description",
        "homepage",
        "section",
        "vcs_browser",
        "vcs_git",
        "build_depends",
        "depends",
        "distributions",
    ];

    /// Build settings from `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            raw.set(key.as_ref(), value)?;
        }
        Ok(raw)
    }

    fn slot(&self, key: &str) -> Option<&Option<String>> {
        Some(match key {
            "name" => &self.name,
            "version" => &self.version,
            "revision" => &self.revision,
            "copyright" => &self.copyright,
            "archive" => &self.archive,
            "email" => &self.email,
            "maintainer" => &self.maintainer,
            "description" => &self.description,
            "long_description" => &self.long_description,
            "homepage" => &self.homepage,
            "section" => &self.section,
            "vcs_browser" => &self.vcs_browser,
            "vcs_git" => &self.vcs_git,
            "build_depends" => &self.build_depends,
            "depends" => &self.depends,
            "distributions" => &self.distributions,
            _ => return None,
        })
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        Some(match key {
            "name" => &mut self.name,
            "version" => &mut self.version,
            "revision" => &mut self.revision,
            "copyright" => &mut self.copyright,
            "archive" => &mut self.archive,
            "email" => &mut self.email,
            "maintainer" => &mut self.maintainer,
            "description" => &mut self.description,
            "long_description" => &mut self.long_description,
            "homepage" => &mut self.homepage,
            "section" => &mut self.section,
            "vcs_browser" => &mut self.vcs_browser,
            "vcs_git" => &mut self.vcs_git,
            "build_depends" => &mut self.build_depends,
            "depends" => &mut self.depends,
            "distributions" => &mut self.distributions,
            _ => return None,
        })
    }

    /// Look a value up by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.slot(key).and_then(|v| v.as_deref())
    }

    /// Set a value by key
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let slot = self
            .slot_mut(key)
            .ok_or_else(|| Error::config(format!("Unknown package setting: {key}")))?;
        *slot = Some(value.into());
        Ok(())
    }

    /// Overlay `DEBRELEASE_<KEY>` variables from an environment listing.
    ///
    /// Unrelated variables are ignored, unknown keys under the prefix are
    /// logged and skipped.
    pub fn overlay<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(crate::ENV_PREFIX) else {
                continue;
            };
            let key = key.to_lowercase();
            if self.slot(&key).is_none() {
                warn!("Ignoring unknown package setting in environment: {}", name);
                continue;
            }
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Rewrite every present value through `f`
    pub fn expand_with<F>(&mut self, f: F) -> Result<()>
    where
        F: Fn(&str) -> Result<String>,
    {
        for key in Self::KEYS {
            if let Some(slot) = self.slot_mut(key) {
                if let Some(value) = slot.as_deref() {
                    *slot = Some(f(value)?);
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlatScalar {
    Text(String),
    Number(serde_yaml::Number),
    Flag(bool),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlatValue {
    Scalar(FlatScalar),
    List(Vec<FlatScalar>),
}

impl FlatScalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
            Self::Flag(b) => b.to_string(),
        }
    }
}

/// Accept scalars and sequences, storing sequences comma joined
fn flat_value<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlatValue>::deserialize(deserializer)?.map(|value| match value {
        FlatValue::Scalar(scalar) => scalar.into_string(),
        FlatValue::List(items) => items
            .into_iter()
            .map(FlatScalar::into_string)
            .collect::<Vec<_>>()
            .join(","),
    }))
}

/// Accept only YAML strings.
///
/// Numbers are refused rather than rendered: `3.10` would come back as
/// `3.1` and `01` as `1`.
fn quoted_value<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlatScalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FlatScalar::Text(s)) => Ok(Some(s)),
        Some(FlatScalar::Number(n)) => Err(D::Error::custom(format!(
            "found the number {n}; version strings must be quoted to keep every digit"
        ))),
        Some(FlatScalar::Flag(b)) => Err(D::Error::custom(format!(
            "expected a quoted version string, found {b}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set() {
        let mut raw = RawConfig::default();
        raw.set("homepage", "https://example.org").unwrap();
        assert_eq!(raw.get("homepage"), Some("https://example.org"));
        assert_eq!(raw.get("name"), None);
        assert!(raw.set("colour", "blue").is_err());
    }

    #[test]
    fn test_overlay_environment() {
        let mut raw = RawConfig::from_pairs([("name", "foo"), ("version", "1.0")]).unwrap();
        raw.overlay(vec![
            ("DEBRELEASE_VERSION".to_string(), "1.1".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ])
        .unwrap();

        assert_eq!(raw.get("name"), Some("foo"));
        assert_eq!(raw.get("version"), Some("1.1"));

        raw.overlay(vec![("DEBRELEASE_COLOUR".to_string(), "blue".to_string())])
            .unwrap();
        assert_eq!(raw, RawConfig::from_pairs([("name", "foo"), ("version", "1.1")]).unwrap());
    }

    #[test]
    fn test_yaml_scalars_and_lists() {
        let raw: RawConfig = serde_yaml::from_str(
            "version: \"3.10\"\nrevision: '01'\ndepends: [python3, libffi8]\ndistributions: \
             focal\nsection: 42\n",
        )
        .unwrap();

        assert_eq!(raw.get("version"), Some("3.10"));
        assert_eq!(raw.get("revision"), Some("01"));
        assert_eq!(raw.get("section"), Some("42"));
        assert_eq!(raw.get("depends"), Some("python3,libffi8"));
        assert_eq!(raw.get("distributions"), Some("focal"));
    }

    #[test]
    fn test_unquoted_versions_rejected() {
        let err = serde_yaml::from_str::<RawConfig>("version: 3.10\n").unwrap_err();
        assert!(err.to_string().contains("quoted"), "{err}");

        assert!(serde_yaml::from_str::<RawConfig>("revision: 01\n").is_err());
        assert!(serde_yaml::from_str::<RawConfig>("version: 2.7.1\n").is_ok());
    }
}
