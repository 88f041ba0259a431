// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Deciding which pins move where.

use crate::index::LatestVersions;
use crate::project::{DependencyGroup, DependencyLocation, Requirement};

/// One pinned dependency that will be moved to a new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub location: DependencyLocation,
    pub requirement: Requirement,
    pub from: String,
    pub to: String,
}

impl PlanEntry {
    /// The spec passed to `uv add`.
    pub fn new_spec(&self) -> String {
        self.requirement.with_version(&self.to)
    }
}

/// Every planned update, in gather order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepinPlan {
    entries: Vec<PlanEntry>,
}

impl RepinPlan {
    /// Compare each pin with the latest known version.
    ///
    /// Pins without a known latest version, and pins already current, are
    /// left out.
    pub fn build(groups: &[DependencyGroup], latest: &LatestVersions) -> Self {
        let mut entries = Vec::new();
        for group in groups {
            for req in group.pinned() {
                let Some(from) = req.pinned.as_deref() else {
                    continue;
                };
                match latest.get(&req.normalized_name()) {
                    Some(to) if to != from => entries.push(PlanEntry {
                        location: group.location.clone(),
                        requirement: req.clone(),
                        from: from.to_string(),
                        to: to.clone(),
                    }),
                    Some(_) => {}
                    None => tracing::debug!("No latest version known for {}", req.name),
                }
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries grouped by location, keeping first-seen order.
    pub fn by_location(&self) -> Vec<(&DependencyLocation, Vec<&PlanEntry>)> {
        let mut grouped: Vec<(&DependencyLocation, Vec<&PlanEntry>)> = Vec::new();
        for entry in &self.entries {
            match grouped.iter_mut().find(|(loc, _)| **loc == entry.location) {
                Some((_, items)) => items.push(entry),
                None => grouped.push((&entry.location, vec![entry])),
            }
        }
        grouped
    }
}

/// Distinct pinned package names across groups, first-seen order.
pub fn pinned_packages(groups: &[DependencyGroup]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for req in groups.iter().flat_map(|g| g.pinned()) {
        let name = req.normalized_name();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
