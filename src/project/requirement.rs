// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! PEP 508 requirement strings, reduced to what repinning needs.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref REQUIREMENT_RE: Regex = Regex::new(
        r"^\s*(?P<name>[A-Za-z0-9][A-Za-z0-9_.-]*)(?P<extras>\[[^\]]+\])?\s*(?P<op>===|==|!=|<=|>=|~=|<|>)?\s*(?P<ver>[^;\s]+)?\s*$"
    )
    .unwrap();
    static ref NAME_SEPARATORS: Regex = Regex::new(r"[-_.]+").unwrap();
}

/// Prefixes of direct references that are never repinned.
const DIRECT_REFERENCE_PREFIXES: &[&str] = &["file:", "path:", "git+", "hg+", "svn+"];

/// Normalize a distribution name per PEP 503.
pub fn normalize_name(name: &str) -> String {
    NAME_SEPARATORS.replace_all(name, "-").to_lowercase()
}

/// A direct dependency as written in `pyproject.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// The original requirement string.
    pub raw: String,
    /// Distribution name as written.
    pub name: String,
    /// Extras including brackets, e.g. `[uvicorn]`, or empty.
    pub extras: String,
    /// The exact version when the requirement uses `==`.
    pub pinned: Option<String>,
    /// Environment marker after `;`.
    pub marker: Option<String>,
}

/// Outcome of parsing one requirement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRequirement {
    /// A URL, path or VCS reference; left untouched.
    Skip,
    /// A name-based requirement.
    Requirement(Requirement),
}

impl Requirement {
    /// Parse a requirement string.
    ///
    /// Returns `None` for blank lines, comments and text that is not a
    /// recognisable requirement.
    pub fn parse(line: &str) -> Option<ParsedRequirement> {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            return None;
        }
        if s.contains('@') || DIRECT_REFERENCE_PREFIXES.iter().any(|p| s.starts_with(p)) {
            return Some(ParsedRequirement::Skip);
        }

        let (left, marker) = match s.split_once(';') {
            Some((left, marker)) => (left, Some(marker.trim().to_string())),
            None => (s, None),
        };

        let caps = REQUIREMENT_RE.captures(left.trim())?;
        let pinned = match caps.name("op").map(|m| m.as_str()) {
            Some("==") => caps.name("ver").map(|m| m.as_str().to_string()),
            _ => None,
        };

        Some(ParsedRequirement::Requirement(Requirement {
            raw: line.to_string(),
            name: caps["name"].to_string(),
            extras: caps
                .name("extras")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            pinned,
            marker,
        }))
    }

    /// Parse a requirement, keeping only name-based ones.
    pub fn parse_direct(line: &str) -> Option<Requirement> {
        match Self::parse(line)? {
            ParsedRequirement::Requirement(req) => Some(req),
            ParsedRequirement::Skip => {
                tracing::debug!("Skipping direct reference: {}", line);
                None
            }
        }
    }

    /// PEP 503 normalized name.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Name with extras, e.g. `fastapi[all]`.
    pub fn name_with_extras(&self) -> String {
        format!("{}{}", self.name, self.extras)
    }

    /// Display label: name, extras and marker.
    pub fn label(&self) -> String {
        match &self.marker {
            Some(marker) => format!("{}; {}", self.name_with_extras(), marker),
            None => self.name_with_extras(),
        }
    }

    /// Render this requirement pinned to `version`, keeping extras and marker.
    pub fn with_version(&self, version: &str) -> String {
        let spec = format!("{}=={}", self.name_with_extras(), version);
        match &self.marker {
            Some(marker) => format!("{}; {}", spec, marker),
            None => spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Requirement {
        match Requirement::parse(line) {
            Some(ParsedRequirement::Requirement(req)) => req,
            other => panic!("Expected requirement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_requirement() {
        let req = parsed("requests==2.28.1");
        assert_eq!(req.name, "requests");
        assert_eq!(req.extras, "");
        assert_eq!(req.pinned.as_deref(), Some("2.28.1"));
        assert_eq!(req.marker, None);
    }

    #[test]
    fn test_parse_requirement_with_extras() {
        let req = parsed("fastapi[uvicorn]==0.95.2");
        assert_eq!(req.name, "fastapi");
        assert_eq!(req.extras, "[uvicorn]");
        assert_eq!(req.pinned.as_deref(), Some("0.95.2"));
    }

    #[test]
    fn test_parse_requirement_with_marker() {
        let req = parsed("pytest==7.4.0; python_version >= '3.8'");
        assert_eq!(req.pinned.as_deref(), Some("7.4.0"));
        assert_eq!(req.marker.as_deref(), Some("python_version >= '3.8'"));
    }

    #[test]
    fn test_parse_requirement_without_pin() {
        assert_eq!(parsed("requests").pinned, None);
        assert_eq!(parsed("requests>=2.0").pinned, None);
        assert_eq!(parsed("django~=4.2").pinned, None);
    }

    #[test]
    fn test_parse_arbitrary_equality_is_not_a_pin() {
        assert_eq!(parsed("legacy===1.0-custom").pinned, None);
    }

    #[test]
    fn test_parse_skip_direct_references() {
        assert_eq!(
            Requirement::parse("git+https://github.com/user/repo.git"),
            Some(ParsedRequirement::Skip)
        );
        assert_eq!(
            Requirement::parse("mypkg @ file:///src/mypkg"),
            Some(ParsedRequirement::Skip)
        );
    }

    #[test]
    fn test_parse_blank_and_comment() {
        assert_eq!(Requirement::parse("  "), None);
        assert_eq!(Requirement::parse("# this is a comment"), None);
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(Requirement::parse("!!not a requirement"), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Flask_SQLAlchemy"), "flask-sqlalchemy");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("a--b__c"), "a-b-c");
    }

    #[test]
    fn test_with_version_keeps_extras_and_marker() {
        let req = parsed("uvicorn[standard]==0.20.0; sys_platform != 'win32'");
        assert_eq!(
            req.with_version("0.30.1"),
            "uvicorn[standard]==0.30.1; sys_platform != 'win32'"
        );
        assert_eq!(req.label(), "uvicorn[standard]; sys_platform != 'win32'");
    }
}
