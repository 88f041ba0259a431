// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Latest versions from the project environment via `uv pip list --outdated`.

use crate::error::{RepinError, Result, UvError};
use crate::project::normalize_name;
use crate::uv::{display_command, Uv, UvRunner};
use lazy_static::lazy_static;
use regex::Regex;

use super::{LatestVersions, VersionSource};

lazy_static! {
    static ref COLUMN_SPLIT: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref PACKAGE_HEADER: Regex = Regex::new(r"\bPackage\b").unwrap();
    static ref LATEST_HEADER: Regex = Regex::new(r"\bLatest\b").unwrap();
}

/// Parse the table printed by `uv pip list --outdated`.
pub fn parse_outdated_table(text: &str) -> LatestVersions {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let start = lines
        .iter()
        .position(|l| PACKAGE_HEADER.is_match(l) && LATEST_HEADER.is_match(l))
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut latest = LatestVersions::new();
    for line in &lines[start..] {
        if line.chars().all(|c| c == '-') {
            continue;
        }
        let cols: Vec<&str> = COLUMN_SPLIT.split(line).collect();
        if cols.len() < 3 {
            continue;
        }
        let Some(version) = cols[2].split_whitespace().next() else {
            continue;
        };
        latest.insert(normalize_name(cols[0]), version.to_string());
    }
    latest
}

/// Reads latest versions from the environment `uv` manages for the project.
pub struct EnvironmentSource<'a, R: UvRunner> {
    uv: &'a Uv<R>,
}

impl<'a, R: UvRunner> EnvironmentSource<'a, R> {
    pub fn new(uv: &'a Uv<R>) -> Self {
        Self { uv }
    }
}

impl<R: UvRunner> VersionSource for EnvironmentSource<'_, R> {
    fn name(&self) -> &str {
        "the environment"
    }

    fn latest_version(&self, package: &str, allow_pre: bool) -> Option<String> {
        self.latest_versions(&[package.to_string()], allow_pre)
            .ok()?
            .remove(&normalize_name(package))
    }

    fn latest_versions(&self, packages: &[String], allow_pre: bool) -> Result<LatestVersions> {
        if allow_pre {
            tracing::debug!("Pre-release selection is decided by uv for the environment source");
        }

        let output = self.uv.pip_list_outdated()?;
        if !output.success() {
            return Err(RepinError::Uv(UvError::CommandFailed {
                command: display_command(&["pip".into(), "list".into(), "--outdated".into()]),
                code: output.code,
                stderr: output.stderr,
            }));
        }

        let wanted: Vec<String> = packages.iter().map(|p| normalize_name(p)).collect();
        Ok(parse_outdated_table(&output.stdout)
            .into_iter()
            .filter(|(name, _)| wanted.contains(name))
            .collect())
    }
}
