// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Latest-version lookup.
//!
//! A [`VersionSource`] answers "what is the newest release of this package".
//! The PyPI JSON API is the default; the project environment (through
//! `uv pip list --outdated`) is the alternative.

mod outdated;
mod pypi;
pub mod version;

pub use outdated::{parse_outdated_table, EnvironmentSource};
pub use pypi::{select_latest, ProjectMetadata, PyPiClient};
pub use version::{compare_versions, is_prerelease, max_version, PackageVersion};

use crate::error::Result;
use std::collections::HashMap;

/// Map of PEP 503 normalized package name to latest version.
pub type LatestVersions = HashMap<String, String>;

/// Something that knows the latest published version of a package.
pub trait VersionSource {
    /// Label used in user-facing messages, e.g. `PyPI`.
    fn name(&self) -> &str;

    /// Latest version of one package, or `None` when unknown.
    fn latest_version(&self, package: &str, allow_pre: bool) -> Option<String>;

    /// Latest versions of many packages, keyed by normalized name.
    ///
    /// Packages that could not be resolved are absent from the result.
    fn latest_versions(&self, packages: &[String], allow_pre: bool) -> Result<LatestVersions>;
}
