// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Configuration schema definitions.
//!
//! Defines the settings that can be loaded from `uvrepin.toml` or from the
//! `[tool.uvrepin]` table of a project's `pyproject.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default PyPI base URL.
pub const DEFAULT_PYPI_URL: &str = "https://pypi.org";

/// The main configuration structure for uvrepin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepinConfig {
    /// Additional index URLs forwarded to `uv add --index`.
    pub indexes: Vec<String>,

    /// Whether pre-releases are acceptable upgrade targets.
    pub pre: bool,

    /// Groups to consider (empty means all). `main` is `[project.dependencies]`.
    pub only_groups: Vec<String>,

    /// Target-version policy for workspace conflicts.
    pub policy: ConflictPolicy,

    /// Where latest versions come from.
    pub source: VersionSourceKind,

    /// Base URL of the PyPI JSON API.
    pub pypi_url: String,

    /// Maximum number of concurrent index lookups.
    pub concurrency: usize,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// The uv executable.
    pub uv: PathBuf,

    /// Accept workspace conflict resolution without prompting.
    pub auto_accept: bool,
}

impl Default for RepinConfig {
    fn default() -> Self {
        Self {
            indexes: Vec::new(),
            pre: false,
            only_groups: Vec::new(),
            policy: ConflictPolicy::Latest,
            source: VersionSourceKind::Pypi,
            pypi_url: DEFAULT_PYPI_URL.to_string(),
            concurrency: 10,
            timeout_secs: 15,
            uv: PathBuf::from("uv"),
            auto_accept: false,
        }
    }
}

impl RepinConfig {
    /// Load configuration for a project directory.
    pub fn load(project_dir: &std::path::Path) -> crate::error::Result<Self> {
        super::loader::load_config(project_dir)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &std::path::Path) -> crate::error::Result<Self> {
        super::loader::load_config_from(path)
    }
}

/// How to pick one version when workspace members pin different ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Latest version published on the index.
    #[default]
    Latest,
    /// Highest version among the conflicting pins.
    Max,
}

impl ConflictPolicy {
    /// Get the string representation of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Latest => "latest",
            ConflictPolicy::Max => "max",
        }
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where latest versions are looked up.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum VersionSourceKind {
    /// The PyPI JSON API.
    #[default]
    Pypi,
    /// `uv pip list --outdated` against the project environment.
    Environment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RepinConfig::default();
        assert_eq!(config.pypi_url, "https://pypi.org");
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.policy, ConflictPolicy::Latest);
        assert!(!config.pre);
    }

    #[test]
    fn test_config_serialization() {
        let config = RepinConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("pypi_url"));
        assert!(toml_str.contains("policy = \"latest\""));
    }
}
