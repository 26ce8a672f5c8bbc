//! Changelog header handling

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DebianError, Result};

/// Shape the top changelog line must have
pub const HEADER_ANCHOR: &str = "<source> (<version>) <distribution>; urgency=<urgency>";

/// First line of a changelog entry:
/// `<source> (<version>) <distribution>; urgency=<urgency>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogHeader {
    pub source: String,
    pub version: String,
    pub distribution: String,
    pub urgency: String,
}

impl ChangelogHeader {
    fn regex() -> Regex {
        Regex::new(r"^(\S+) \(([^)\s]+)\) ([^;]+); urgency=(\S+)").expect("Valid regex")
    }

    /// Parse a header line
    pub fn parse(line: &str) -> Option<Self> {
        let captures = Self::regex().captures(line)?;
        Some(Self {
            source: captures[1].to_string(),
            version: captures[2].to_string(),
            distribution: captures[3].trim().to_string(),
            urgency: captures[4].to_string(),
        })
    }

    /// Read the header of the top entry in `content`
    pub fn top(file: &str, content: &str) -> Result<Self> {
        let line = content.lines().next().unwrap_or_default();
        Self::parse(line).ok_or_else(|| DebianError::templating(file, HEADER_ANCHOR))
    }
}

impl fmt::Display for ChangelogHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}; urgency={}",
            self.source, self.version, self.distribution, self.urgency
        )
    }
}

/// Replace the header of the top entry, leaving the rest untouched
pub fn rewrite_top_header(file: &str, content: &str, header: &ChangelogHeader) -> Result<String> {
    ChangelogHeader::top(file, content)?;

    let rest = content.split_once('\n').map(|(_, rest)| rest);
    Ok(match rest {
        Some(rest) => format!("{header}\n{rest}"),
        None => format!("{header}\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = "foo (1.0-1) unstable; urgency=medium\n\n  * Initial release.\n\n -- \
                             Packager <p@example.org>  Mon, 19 Oct 2026 10:00:00 +0000\n";

    #[test]
    fn test_parse_header() {
        let header = ChangelogHeader::top("changelog", CHANGELOG).unwrap();
        assert_eq!(header.source, "foo");
        assert_eq!(header.version, "1.0-1");
        assert_eq!(header.distribution, "unstable");
        assert_eq!(header.urgency, "medium");
        assert_eq!(header.to_string(), "foo (1.0-1) unstable; urgency=medium");
    }

    #[test]
    fn test_rewrite_top_header() {
        let header = ChangelogHeader {
            source: "foo".to_string(),
            version: "1.0-1~focal1".to_string(),
            distribution: "focal".to_string(),
            urgency: "low".to_string(),
        };
        let rewritten = rewrite_top_header("changelog", CHANGELOG, &header).unwrap();

        assert!(rewritten.starts_with("foo (1.0-1~focal1) focal; urgency=low\n\n  * Initial"));
        assert_eq!(rewritten.lines().count(), CHANGELOG.lines().count());
    }

    #[test]
    fn test_invalid_header() {
        assert!(matches!(
            ChangelogHeader::top("changelog", "not a changelog\n"),
            Err(DebianError::Templating { anchor, .. }) if anchor == HEADER_ANCHOR
        ));
        assert!(ChangelogHeader::top("changelog", "").is_err());

        let header = ChangelogHeader::parse(CHANGELOG.lines().next().unwrap()).unwrap();
        assert!(matches!(
            rewrite_top_header("debian/changelog", "* garbage\n", &header),
            Err(DebianError::Templating { file, .. }) if file == "debian/changelog"
        ));
    }
}
