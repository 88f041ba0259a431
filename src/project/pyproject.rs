// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Reading direct dependencies out of `pyproject.toml`.

use crate::error::{ProjectError, RepinError, Result};
use std::path::{Path, PathBuf};

use super::requirement::{normalize_name, Requirement};

/// File name of a Python project manifest.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Where a dependency lives inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyLocation {
    /// `[project].dependencies`
    Main,
    /// `[project.optional-dependencies].<extra>`
    Optional(String),
    /// `[dependency-groups].<group>` (PEP 735)
    Group(String),
}

impl DependencyLocation {
    /// Name shown to users; `main` for the main dependency list.
    pub fn name(&self) -> &str {
        match self {
            DependencyLocation::Main => "main",
            DependencyLocation::Optional(name) | DependencyLocation::Group(name) => name,
        }
    }

    /// Whether a `--only-groups` selection includes this location.
    pub fn is_selected_by(&self, wanted: &[String]) -> bool {
        match self {
            DependencyLocation::Main => wanted.iter().any(|w| w == "main"),
            DependencyLocation::Optional(name) | DependencyLocation::Group(name) => {
                wanted.iter().any(|w| w == name)
            }
        }
    }
}

/// One dependency list and its parsed requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub location: DependencyLocation,
    pub dependencies: Vec<Requirement>,
}

impl DependencyGroup {
    /// Requirements that carry an exact `==` pin.
    pub fn pinned(&self) -> impl Iterator<Item = &Requirement> {
        self.dependencies.iter().filter(|d| d.pinned.is_some())
    }
}

/// A loaded `pyproject.toml`.
#[derive(Debug, Clone)]
pub struct PyProject {
    path: PathBuf,
    document: toml::Value,
}

impl PyProject {
    /// Load `pyproject.toml` from a project directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(PYPROJECT_FILE);
        if !path.exists() {
            let shown = std::fs::canonicalize(dir)
                .map(|d| d.join(PYPROJECT_FILE))
                .unwrap_or_else(|_| path.clone());
            return Err(RepinError::Project(ProjectError::NotFound { path: shown }));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            RepinError::Project(ProjectError::ReadFailed {
                path: path.clone(),
                message: e.to_string(),
            })
        })?;

        Self::parse(path, &content)
    }

    /// Parse a manifest from its contents.
    pub fn parse(path: PathBuf, content: &str) -> Result<Self> {
        let document = toml::from_str(content).map_err(|e: toml::de::Error| {
            RepinError::Project(ProjectError::ParseError {
                path: path.clone(),
                message: e.to_string(),
            })
        })?;
        tracing::debug!("Loaded {}", path.display());
        Ok(Self { path, document })
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the manifest.
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// The raw TOML document.
    pub fn document(&self) -> &toml::Value {
        &self.document
    }

    /// `project.name`, when declared.
    pub fn project_name(&self) -> Option<&str> {
        self.document
            .get("project")
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
    }

    /// Gather direct dependencies in declaration order: main, optional
    /// extras, then dependency groups.
    pub fn direct_dependencies(&self) -> Vec<DependencyGroup> {
        let mut groups = Vec::new();
        let project = self.document.get("project");

        if let Some(deps) = project
            .and_then(|p| p.get("dependencies"))
            .and_then(|d| d.as_array())
        {
            if !deps.is_empty() {
                groups.push(DependencyGroup {
                    location: DependencyLocation::Main,
                    dependencies: parse_array(deps),
                });
            }
        }

        let optional = project
            .and_then(|p| p.get("optional-dependencies"))
            .and_then(|o| o.as_table());
        for (name, value) in optional.into_iter().flatten() {
            push_named_group(&mut groups, DependencyLocation::Optional(name.clone()), value);
        }

        let dep_groups = self
            .document
            .get("dependency-groups")
            .and_then(|g| g.as_table());
        for (name, value) in dep_groups.into_iter().flatten() {
            push_named_group(&mut groups, DependencyLocation::Group(name.clone()), value);
        }

        groups
    }

    /// Find where a package is declared, with its requirement. Main
    /// dependencies win over optional extras, which win over dependency
    /// groups.
    pub fn find(&self, package: &str) -> Option<(DependencyLocation, Requirement)> {
        let wanted = normalize_name(package);
        self.direct_dependencies().into_iter().find_map(|g| {
            g.dependencies
                .into_iter()
                .find(|d| d.normalized_name() == wanted)
                .map(|d| (g.location, d))
        })
    }

    /// Where a package is declared, if anywhere.
    pub fn locate(&self, package: &str) -> Option<DependencyLocation> {
        self.find(package).map(|(location, _)| location)
    }
}

fn push_named_group(groups: &mut Vec<DependencyGroup>, location: DependencyLocation, value: &toml::Value) {
    let Some(arr) = value.as_array() else {
        tracing::debug!("Ignoring non-array group '{}'", location.name());
        return;
    };
    let dependencies = parse_array(arr);
    if !dependencies.is_empty() {
        groups.push(DependencyGroup {
            location,
            dependencies,
        });
    }
}

fn parse_array(values: &[toml::Value]) -> Vec<Requirement> {
    values
        .iter()
        .filter_map(|v| v.as_str())
        .filter_map(Requirement::parse_direct)
        .collect()
}

/// Keep only the groups named in `wanted`; an empty selection keeps all.
pub fn filter_groups(groups: Vec<DependencyGroup>, wanted: &[String]) -> Vec<DependencyGroup> {
    let wanted: Vec<String> = wanted
        .iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();
    if wanted.is_empty() {
        return groups;
    }
    groups
        .into_iter()
        .filter(|g| g.location.is_selected_by(&wanted))
        .collect()
}
