// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Recognising workspace pin conflicts in `uv lock` output.

use crate::config::ConflictPolicy;
use crate::index::{max_version, VersionSource};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

/// Marker uv prints when resolution fails.
const NO_SOLUTION: &str = "No solution found when resolving dependencies";

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Because common[dev] depends on flake8==7.2.0 and qluster-sdk[dev] depends on flake8==7.3.0
    static ref EXTRA_PAIR: Regex = Regex::new(
        r"Because ([^\[]+)\[([^\]]+)\] depends on ([^=]+)==(\S+) and ([^\[]+)\[([^\]]+)\] depends on ([^=]+)==([^\s,]+)"
    )
    .unwrap();

    // Because common depends on pydantic==2.11.7 and qluster-sdk[dev] depends on
    // pydantic==2.11.5, we can conclude that common[dev] and qluster-sdk[dev] are incompatible.
    static ref INCOMPATIBLE_EXTRAS: Regex = Regex::new(
        r"Because ([a-zA-Z0-9_-]+) depends on ([^=]+)==([^\s,]+) and ([a-zA-Z0-9_-]+)\[([^\]]+)\] depends on ([^=]+)==([^\s,]+).*?([a-zA-Z0-9_-]+)\[(\w+)\] and ([a-zA-Z0-9_-]+)\[(\w+)\] are incompatible"
    )
    .unwrap();
}

/// One package pinned differently by workspace members within an extra.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConflict {
    pub package: String,
    pub extra: String,
    /// Member name and its pinned version, in the order uv reported them.
    pub pins: Vec<(String, String)>,
}

impl WorkspaceConflict {
    pub fn new(package: &str, extra: &str, pins: &[(&str, &str)]) -> Self {
        Self {
            package: package.to_string(),
            extra: extra.to_string(),
            pins: pins
                .iter()
                .map(|(m, v)| (m.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Members involved in this conflict.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.pins.iter().map(|(m, _)| m.as_str())
    }

    /// Greatest version among the conflicting pins.
    pub fn max_pinned(&self) -> Option<&str> {
        max_version(self.pins.iter().map(|(_, v)| v.as_str()))
    }

    fn add_pin(&mut self, member: String, version: String) {
        if !self.pins.iter().any(|(m, _)| *m == member) {
            self.pins.push((member, version));
        }
    }
}

fn clean_version(raw: &str) -> String {
    raw.trim().trim_end_matches(['.', ',']).to_string()
}

fn push_conflict(
    conflicts: &mut Vec<WorkspaceConflict>,
    package: &str,
    extra: &str,
    pins: [(&str, &str); 2],
) {
    let package = package.trim();
    let extra = extra.trim();
    let index = match conflicts
        .iter()
        .position(|c| c.package == package && c.extra == extra)
    {
        Some(index) => index,
        None => {
            conflicts.push(WorkspaceConflict::new(package, extra, &[]));
            conflicts.len() - 1
        }
    };
    for (member, version) in pins {
        conflicts[index].add_pin(member.trim().to_string(), clean_version(version));
    }
}

/// Parse workspace conflicts from uv's stderr.
///
/// Returns `None` when the output is not a resolution failure. A resolution
/// failure without any recognisable conflict yields an empty list.
pub fn parse_workspace_conflicts(stderr: &str) -> Option<Vec<WorkspaceConflict>> {
    if !stderr.contains(NO_SOLUTION) {
        return None;
    }

    let normalized = WHITESPACE.replace_all(stderr, " ");
    let mut conflicts = Vec::new();

    for caps in EXTRA_PAIR.captures_iter(&normalized) {
        let (extra1, pkg1) = (&caps[2], &caps[3]);
        let (extra2, pkg2) = (&caps[6], &caps[7]);
        if extra1 != extra2 || pkg1 != pkg2 {
            tracing::debug!("Ignoring mismatched conflict: {}", &caps[0]);
            continue;
        }
        push_conflict(
            &mut conflicts,
            pkg1,
            extra1,
            [(&caps[1], &caps[4]), (&caps[5], &caps[8])],
        );
    }

    for caps in INCOMPATIBLE_EXTRAS.captures_iter(&normalized) {
        let (member1, pkg1, ver1) = (&caps[1], &caps[2], &caps[3]);
        let (member2, pkg2, ver2) = (&caps[4], &caps[6], &caps[7]);
        let members_match = &caps[8] == member1 && &caps[10] == member2;
        if !members_match || caps[9] != caps[11] || pkg1 != pkg2 {
            tracing::debug!("Ignoring mismatched conflict: {}", &caps[0]);
            continue;
        }
        push_conflict(
            &mut conflicts,
            pkg1,
            &caps[9],
            [(member1, ver1), (member2, ver2)],
        );
    }

    tracing::debug!("Recognised {} workspace conflicts", conflicts.len());
    Some(conflicts)
}

/// Choose one version per conflicting package.
///
/// `latest` asks the version source and falls back to the greatest pinned
/// version; `max` always uses the greatest pinned version.
pub fn determine_target_versions(
    conflicts: &[WorkspaceConflict],
    policy: ConflictPolicy,
    source: &dyn VersionSource,
    allow_pre: bool,
) -> BTreeMap<String, String> {
    let mut targets = BTreeMap::new();

    for conflict in conflicts {
        if targets.contains_key(&conflict.package) {
            continue;
        }
        let target = match policy {
            ConflictPolicy::Latest => source
                .latest_version(&conflict.package, allow_pre)
                .or_else(|| {
                    tracing::debug!(
                        "No latest version for {}, using highest pin",
                        conflict.package
                    );
                    conflict.max_pinned().map(String::from)
                }),
            ConflictPolicy::Max => conflict.max_pinned().map(String::from),
        };
        if let Some(target) = target {
            targets.insert(conflict.package.clone(), target);
        }
    }

    targets
}
