// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Construction of `uv add` command lines.

use crate::project::DependencyLocation;
use std::path::{Path, PathBuf};

/// Builder for `uv add`.
#[derive(Debug, Clone)]
pub struct AddCommand {
    location: DependencyLocation,
    project: Option<PathBuf>,
    frozen: bool,
    prerelease: bool,
    indexes: Vec<String>,
    specs: Vec<String>,
}

impl AddCommand {
    /// Add to the dependency list at `location`.
    pub fn new(location: DependencyLocation) -> Self {
        Self {
            location,
            project: None,
            frozen: false,
            prerelease: false,
            indexes: Vec::new(),
            specs: Vec::new(),
        }
    }

    /// Target another workspace member with `--project`.
    pub fn project(mut self, dir: &Path) -> Self {
        self.project = Some(dir.to_path_buf());
        self
    }

    /// Skip resolution (`--frozen`); the caller locks afterwards.
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Allow pre-releases (`--prerelease always`).
    pub fn prerelease(mut self, allow: bool) -> Self {
        self.prerelease = allow;
        self
    }

    /// Extra index URLs.
    pub fn indexes(mut self, indexes: &[String]) -> Self {
        self.indexes.extend(indexes.iter().cloned());
        self
    }

    /// Requirement specs to add.
    pub fn specs<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specs.extend(specs.into_iter().map(Into::into));
        self
    }

    /// The argument vector, without the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["add".to_string()];

        if let Some(ref project) = self.project {
            args.push("--project".to_string());
            args.push(project.display().to_string());
        }
        if self.frozen {
            args.push("--frozen".to_string());
        }
        match &self.location {
            DependencyLocation::Main => {}
            DependencyLocation::Optional(name) => {
                args.push("--optional".to_string());
                args.push(name.clone());
            }
            DependencyLocation::Group(name) => {
                args.push("--group".to_string());
                args.push(name.clone());
            }
        }
        if self.prerelease {
            args.push("--prerelease".to_string());
            args.push("always".to_string());
        }
        for index in &self.indexes {
            args.push("--index".to_string());
            args.push(index.clone());
        }
        args.extend(self.specs.iter().cloned());

        args
    }
}
