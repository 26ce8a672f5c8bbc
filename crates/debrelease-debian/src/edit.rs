//! Anchored text edits
//!
//! Every edit names the line or token it expects to find. A missing anchor
//! is a [`DebianError::Templating`], never a silent no-op, so a skeleton
//! whose format drifted cannot yield a half populated control file.

use std::fmt;

use regex::Regex;

use crate::error::{DebianError, Result};

/// How a line is located
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor<'a> {
    /// The line, ignoring trailing whitespace, equals the text
    Exact(&'a str),
    /// The line starts with the text
    Prefix(&'a str),
    /// The line contains the text
    Contains(&'a str),
}

impl Anchor<'_> {
    fn matches(&self, line: &str) -> bool {
        match self {
            Self::Exact(text) => line.trim_end() == *text,
            Self::Prefix(text) => line.starts_with(text),
            Self::Contains(text) => line.contains(text),
        }
    }
}

impl fmt::Display for Anchor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(text) | Self::Prefix(text) | Self::Contains(text) => f.write_str(text),
        }
    }
}

/// A file's text together with the name used in diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredText {
    file: String,
    lines: Vec<String>,
    trailing_newline: bool,
}

impl AnchoredText {
    /// Wrap `content` read from `file`
    pub fn new(file: impl Into<String>, content: &str) -> Self {
        Self {
            file: file.into(),
            lines: content.lines().map(str::to_string).collect(),
            trailing_newline: content.ends_with('\n') || content.is_empty(),
        }
    }

    /// File name used in diagnostics
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Current lines
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn position(&self, anchor: Anchor<'_>) -> Result<usize> {
        self.lines
            .iter()
            .position(|line| anchor.matches(line))
            .ok_or_else(|| DebianError::templating(&self.file, anchor.to_string()))
    }

    /// Whether any line matches `anchor`
    pub fn contains(&self, anchor: Anchor<'_>) -> bool {
        self.lines.iter().any(|line| anchor.matches(line))
    }

    /// Replace the first matching line with `replacement` (may span lines)
    pub fn replace_line(&mut self, anchor: Anchor<'_>, replacement: &str) -> Result<()> {
        let index = self.position(anchor)?;
        let new_lines: Vec<String> = replacement.lines().map(str::to_string).collect();
        self.lines.splice(index..=index, new_lines);
        Ok(())
    }

    /// Append `values` to a control field, honouring continuation lines.
    ///
    /// `Field: a` becomes `Field: a, x, y`; a field whose last continuation
    /// line ends in a comma gets ` x, y` instead.
    pub fn append_to_field(&mut self, field: &str, values: &[String]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        let prefix = format!("{field}:");
        let start = self.position(Anchor::Prefix(&prefix))?;
        let mut last = start;
        while last + 1 < self.lines.len() && is_continuation(&self.lines[last + 1]) {
            last += 1;
        }

        let joined = values.join(", ");
        let line = self.lines[last].trim_end().to_string();
        self.lines[last] = if line.ends_with(',') || line == prefix {
            format!("{line} {joined}")
        } else {
            format!("{line}, {joined}")
        };
        Ok(())
    }

    /// Replace the first match of `pattern` anywhere in the text
    pub fn replace_token(&mut self, pattern: &Regex, replacement: &str, anchor: &str) -> Result<()> {
        let index = self
            .lines
            .iter()
            .position(|line| pattern.is_match(line))
            .ok_or_else(|| DebianError::templating(&self.file, anchor))?;

        let line = &self.lines[index];
        self.lines[index] = pattern
            .replace(line, regex::NoExpand(replacement))
            .into_owned();
        Ok(())
    }

    /// Append a block unless a line equal to `marker` already exists
    pub fn append_block_once(&mut self, marker: &str, block: &str) {
        if self.contains(Anchor::Exact(marker)) {
            return;
        }
        if self.lines.last().is_some_and(|l| !l.trim().is_empty()) {
            self.lines.push(String::new());
        }
        self.lines.extend(block.lines().map(str::to_string));
    }

    /// Render back to text
    pub fn into_string(self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

fn is_continuation(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_line_missing_anchor() {
        let mut text = AnchoredText::new("control", "Source: foo\nSection: unknown\n");
        let err = text
            .replace_line(Anchor::Exact("Homepage: <insert the upstream URL, if relevant>"), "x")
            .unwrap_err();
        match err {
            DebianError::Templating { file, anchor } => {
                assert_eq!(file, "control");
                assert!(anchor.starts_with("Homepage:"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_replace_line_with_block() {
        let mut text = AnchoredText::new("control", "A\nPLACEHOLDER\nB\n");
        text.replace_line(Anchor::Exact("PLACEHOLDER"), " one\n .\n two")
            .unwrap();
        assert_eq!(text.into_string(), "A\n one\n .\n two\nB\n");
    }

    #[test]
    fn test_append_to_single_line_field() {
        let mut text = AnchoredText::new(
            "control",
            "Build-Depends: debhelper-compat (= 13)\nDepends: ${shlibs:Depends}, ${misc:Depends}\n",
        );
        text.append_to_field("Build-Depends", &["libssl-dev".to_string(), "zlib1g-dev".to_string()])
            .unwrap();
        text.append_to_field("Depends", &["python3".to_string()])
            .unwrap();

        assert_eq!(
            text.into_string(),
            "Build-Depends: debhelper-compat (= 13), libssl-dev, zlib1g-dev\nDepends: \
             ${shlibs:Depends}, ${misc:Depends}, python3\n"
        );
    }

    #[test]
    fn test_append_to_folded_field() {
        let mut text = AnchoredText::new(
            "control",
            "Build-Depends:\n debhelper-compat (= 13),\nStandards-Version: 4.6.2\n",
        );
        text.append_to_field("Build-Depends", &["libssl-dev".to_string()])
            .unwrap();
        assert_eq!(
            text.into_string(),
            "Build-Depends:\n debhelper-compat (= 13), libssl-dev\nStandards-Version: 4.6.2\n"
        );
    }

    #[test]
    fn test_append_nothing_needs_no_anchor() {
        let mut text = AnchoredText::new("control", "Source: foo\n");
        assert!(text.append_to_field("Depends", &[]).is_ok());
        assert!(text.append_to_field("Depends", &["x".to_string()]).is_err());
    }

    #[test]
    fn test_append_block_once() {
        let mut text = AnchoredText::new("rules", "%:\n\tdh $@\n");
        text.append_block_once("override_dh_auto_test:", "override_dh_auto_test:");
        text.append_block_once("override_dh_auto_test:", "override_dh_auto_test:");
        assert_eq!(text.into_string(), "%:\n\tdh $@\n\noverride_dh_auto_test:\n");
    }
}
