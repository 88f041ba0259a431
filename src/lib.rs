// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! uvrepin - repin direct dependencies of a uv-managed Python project.
//!
//! Every `name==version` direct dependency in `pyproject.toml` is moved to
//! the latest exact version through `uv add --frozen`, followed by a single
//! `uv lock` and an optional `uv sync`.
//!
//! # Features
//!
//! - **Dependency gathering**: main dependencies, optional extras and PEP 735 groups
//! - **Version lookup**: the PyPI JSON API, or `uv pip list --outdated`
//! - **Dry runs**: a table or JSON report of what would change
//! - **Workspace conflicts**: detection and alignment of diverging member pins
//!
//! # Example
//!
//! ```no_run
//! use uvrepin::index::PyPiClient;
//! use uvrepin::project::PyProject;
//! use uvrepin::repin::{pinned_packages, RepinPlan};
//! use uvrepin::index::VersionSource;
//! use uvrepin::RepinConfig;
//!
//! let project = PyProject::load(std::path::Path::new(".")).unwrap();
//! let groups = project.direct_dependencies();
//! let client = PyPiClient::from_config(&RepinConfig::default()).unwrap();
//! let latest = client.latest_versions(&pinned_packages(&groups), false).unwrap();
//!
//! for entry in RepinPlan::build(&groups, &latest).entries() {
//!     println!("{}: {} -> {}", entry.requirement.name, entry.from, entry.to);
//! }
//! ```

// Module declarations
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod project;
pub mod repin;
pub mod uv;
pub mod workspace;

// Re-exports for convenience
pub use config::RepinConfig;
pub use error::{RepinError, Result};

/// Version information embedded at compile time.
pub mod version {
    /// The current version of uvrepin.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// The git SHA at compile time (if available).
    pub const GIT_SHA: Option<&str> = option_env!("VERGEN_GIT_SHA");

    /// The git commit date at compile time (if available).
    pub const GIT_COMMIT_DATE: Option<&str> = option_env!("VERGEN_GIT_COMMIT_DATE");

    /// Get a formatted version string.
    pub fn version_string() -> String {
        match (GIT_SHA, GIT_COMMIT_DATE) {
            (Some(sha), Some(date)) => {
                format!("{} ({} {})", VERSION, &sha[..7.min(sha.len())], date)
            }
            (Some(sha), None) => {
                format!("{} ({})", VERSION, &sha[..7.min(sha.len())])
            }
            _ => VERSION.to_string(),
        }
    }
}
