// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! uv workspace member discovery.

use crate::project::{normalize_name, PyProject, PYPROJECT_FILE};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Members of a uv workspace, keyed by normalized project name.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    root: PathBuf,
    members: HashMap<String, PathBuf>,
}

impl Workspace {
    /// Discover members from `[tool.uv.workspace]` of the root project.
    ///
    /// Member paths are stored relative to the root.
    pub fn discover(root: &Path, project: &PyProject) -> Self {
        let mut workspace = Self {
            root: root.to_path_buf(),
            members: HashMap::new(),
        };

        if let Some(name) = project.project_name() {
            workspace.members.insert(normalize_name(name), PathBuf::from("."));
        }

        let settings = project
            .document()
            .get("tool")
            .and_then(|t| t.get("uv"))
            .and_then(|u| u.get("workspace"));
        let Some(settings) = settings else {
            return workspace;
        };

        let excludes: Vec<glob::Pattern> = string_list(settings.get("exclude"))
            .into_iter()
            .filter_map(|p| match glob::Pattern::new(&p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::debug!("Ignoring invalid exclude pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();

        for pattern in string_list(settings.get("members")) {
            let full = root.join(&pattern);
            let paths = match glob::glob(&full.to_string_lossy()) {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::debug!("Ignoring invalid member pattern '{}': {}", pattern, e);
                    continue;
                }
            };

            for path in paths.flatten() {
                let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                if excludes.iter().any(|ex| ex.matches_path(&relative)) {
                    tracing::debug!("Excluded workspace member {}", relative.display());
                    continue;
                }
                if !path.join(PYPROJECT_FILE).is_file() {
                    continue;
                }
                workspace.add_member(&path, relative);
            }
        }

        tracing::debug!("Discovered {} workspace members", workspace.members.len());
        workspace
    }

    fn add_member(&mut self, dir: &Path, relative: PathBuf) {
        let name = PyProject::load(dir)
            .ok()
            .and_then(|p| p.project_name().map(normalize_name))
            .or_else(|| {
                relative
                    .file_name()
                    .map(|n| normalize_name(&n.to_string_lossy()))
            });
        if let Some(name) = name {
            tracing::debug!("Workspace member {} at {}", name, relative.display());
            self.members.insert(name, relative);
        }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of known members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no member was discovered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Directory of a member as reported by uv, relative to the root.
    ///
    /// Unknown names resolve to a directory of the same name.
    pub fn member_dir(&self, name: &str) -> PathBuf {
        self.members
            .get(&normalize_name(name))
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

fn string_list(value: Option<&toml::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
