// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! A proposed conflict resolution and how it is presented.

use crate::config::ConflictPolicy;
use console::style;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use super::conflict::WorkspaceConflict;
use super::members::Workspace;

/// Environment variable that marks a CI run.
pub const CI_ENV: &str = "CI";

/// Conflicts together with the version each package will be aligned to.
#[derive(Debug, Clone)]
pub struct ConflictResolution {
    pub conflicts: Vec<WorkspaceConflict>,
    pub target_versions: BTreeMap<String, String>,
    pub policy: ConflictPolicy,
}

impl ConflictResolution {
    pub fn new(
        conflicts: Vec<WorkspaceConflict>,
        target_versions: BTreeMap<String, String>,
        policy: ConflictPolicy,
    ) -> Self {
        Self {
            conflicts,
            target_versions,
            policy,
        }
    }

    /// Every member named by a conflict, sorted.
    pub fn affected_members(&self) -> BTreeSet<String> {
        self.conflicts
            .iter()
            .flat_map(|c| c.members().map(String::from))
            .collect()
    }

    /// Extras in first-seen order.
    pub fn extras(&self) -> Vec<&str> {
        let mut extras: Vec<&str> = Vec::new();
        for conflict in &self.conflicts {
            if !extras.contains(&conflict.extra.as_str()) {
                extras.push(&conflict.extra);
            }
        }
        extras
    }

    /// Target version for a package, if one was determined.
    pub fn target(&self, package: &str) -> Option<&str> {
        self.target_versions.get(package).map(String::as_str)
    }

    /// Packages and targets a member must be aligned to.
    pub fn specs_for(&self, member: &str) -> Vec<(&str, &str)> {
        let mut specs = Vec::new();
        for conflict in &self.conflicts {
            if !conflict.members().any(|m| m == member) {
                continue;
            }
            if let Some(target) = self.target(&conflict.package) {
                if !specs.iter().any(|(p, _)| *p == conflict.package) {
                    specs.push((conflict.package.as_str(), target));
                }
            }
        }
        specs
    }

    /// The confirmation question.
    pub fn prompt(&self) -> String {
        format!(
            "Align all pyproject.toml files to target versions ({}) and retry lock?",
            self.policy
        )
    }

    /// Conflict summary, grouped by extra.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        for extra in self.extras() {
            let conflicts: Vec<&WorkspaceConflict> =
                self.conflicts.iter().filter(|c| c.extra == extra).collect();
            let members: BTreeSet<&str> = conflicts.iter().flat_map(|c| c.members()).collect();

            let header = format!(
                "Conflicts detected in extra \"{}\" across {} members:",
                extra,
                members.len()
            );
            let _ = writeln!(out, "\n{}", style(header).yellow().bold());
            for conflict in conflicts {
                let pins: Vec<String> = conflict
                    .pins
                    .iter()
                    .map(|(m, v)| format!("{}(=={})", m, v))
                    .collect();
                let _ = writeln!(
                    out,
                    "  {}: {} → {}",
                    conflict.package,
                    pins.join(" ↔ "),
                    self.target(&conflict.package).unwrap_or("unknown")
                );
            }
        }
        out
    }

    /// Instructions for aligning members by hand.
    pub fn render_manual_help(&self, workspace: &Workspace) -> String {
        let mut out = String::from(
            "\nTo manually resolve these conflicts, align the versions in each member's pyproject.toml:\n",
        );
        for member in self.affected_members() {
            let dir = workspace.member_dir(&member);
            for conflict in self.conflicts.iter().filter(|c| c.members().any(|m| m == member)) {
                let _ = writeln!(
                    out,
                    "  uv add --project {} --optional {} {}=={}",
                    dir.display(),
                    conflict.extra,
                    conflict.package,
                    self.target(&conflict.package).unwrap_or("<version>")
                );
            }
        }
        out.push_str("Then run: uv lock\n");
        out
    }
}

/// Whether a `CI` value means "running in CI".
pub fn is_ci_value(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Whether the current process runs in CI.
pub fn is_ci_environment() -> bool {
    std::env::var(CI_ENV).map(|v| is_ci_value(&v)).unwrap_or(false)
}
