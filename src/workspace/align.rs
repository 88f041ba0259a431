// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Aligning workspace members to target versions.

use crate::error::{RepinError, Result, UvError, WorkspaceError};
use crate::project::{DependencyLocation, PyProject};
use crate::uv::{display_command, AddCommand, Uv, UvRunner};
use console::style;
use std::collections::BTreeMap;
use std::io::Write;

use super::members::Workspace;
use super::resolution::ConflictResolution;

/// Rewrite every affected member to the target versions, then lock and
/// optionally sync.
///
/// Each member gets one `uv add --frozen` per dependency list touched. The
/// first failure stops alignment; files changed so far stay changed.
pub fn align_workspace_members<R: UvRunner, W: Write>(
    resolution: &ConflictResolution,
    workspace: &Workspace,
    uv: &Uv<R>,
    sync: bool,
    out: &mut W,
) -> Result<()> {
    for member in resolution.affected_members() {
        let dir = workspace.member_dir(&member);
        let member_project = PyProject::load(&workspace.root().join(&dir)).ok();
        if member_project.is_none() {
            tracing::debug!("No pyproject.toml for member {}, assuming main dependencies", member);
        }

        let mut by_location: BTreeMap<DependencyLocation, Vec<String>> = BTreeMap::new();
        for (package, target) in resolution.specs_for(&member) {
            let found = member_project.as_ref().and_then(|p| p.find(package));
            let (location, spec) = match found {
                Some((location, req)) => (location, req.with_version(target)),
                None => (DependencyLocation::Main, format!("{}=={}", package, target)),
            };
            by_location.entry(location).or_default().push(spec);
        }

        for (location, specs) in by_location {
            let args = AddCommand::new(location)
                .project(&dir)
                .frozen(true)
                .specs(specs)
                .args();
            writeln!(out, "Running: {}", display_command(&args))?;
            let output = uv.run(&args)?;
            if !output.success() {
                eprint!("{}", output.stderr);
                return Err(RepinError::Workspace(WorkspaceError::AlignmentFailed {
                    member,
                    message: first_line(&output.stderr),
                }));
            }
        }
    }

    writeln!(out, "Running: uv lock")?;
    let lock = uv.lock()?;
    if !lock.success() {
        eprint!("{}", lock.stderr);
        return Err(WorkspaceError::LockAfterAlignment.into());
    }

    if sync {
        writeln!(out, "Running: uv sync")?;
        let synced = uv.sync()?;
        if !synced.success() {
            eprint!("{}", synced.stderr);
            return Err(WorkspaceError::SyncAfterAlignment.into());
        }
    }

    writeln!(
        out,
        "\n{}",
        style("Workspace conflicts resolved successfully.").green().bold()
    )?;
    Ok(())
}

fn first_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(String::from)
        .unwrap_or_else(|| UvError::AddFailed { code: 1 }.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConflictPolicy;
    use crate::uv::testing::ScriptedRunner;
    use crate::uv::CommandOutput;
    use crate::workspace::WorkspaceConflict;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn setup() -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "pyproject.toml",
            "[project]\nname = \"root\"\n\n[tool.uv.workspace]\nmembers = [\"common\", \"qluster-sdk\"]\n",
        );
        write(
            dir.path(),
            "common/pyproject.toml",
            "[project]\nname = \"common\"\n\n[project.optional-dependencies]\ndev = [\"flake8==7.2.0\", \"pytest==8.0.0\"]\n",
        );
        write(
            dir.path(),
            "qluster-sdk/pyproject.toml",
            "[project]\nname = \"qluster-sdk\"\ndependencies = [\"pytest==8.1.0\"]\n\n[dependency-groups]\nlint = [\"flake8==7.3.0\"]\n",
        );
        let root = PyProject::load(dir.path()).unwrap();
        let ws = Workspace::discover(dir.path(), &root);
        (dir, ws)
    }

    fn resolution() -> ConflictResolution {
        ConflictResolution::new(
            vec![
                WorkspaceConflict::new("flake8", "dev", &[("common", "7.2.0"), ("qluster-sdk", "7.3.0")]),
                WorkspaceConflict::new("pytest", "dev", &[("common", "8.0.0"), ("qluster-sdk", "8.1.0")]),
            ],
            BTreeMap::from([
                ("flake8".to_string(), "7.4.0".to_string()),
                ("pytest".to_string(), "8.2.0".to_string()),
            ]),
            ConflictPolicy::Latest,
        )
    }

    #[test]
    fn test_align_uses_member_locations() {
        let (dir, ws) = setup();
        let uv = Uv::new(ScriptedRunner::default(), dir.path());
        let mut out = Vec::new();

        align_workspace_members(&resolution(), &ws, &uv, false, &mut out).unwrap();

        assert_eq!(
            uv.runner().commands(),
            vec![
                "--version",
                "add --project common --frozen --optional dev flake8==7.4.0 pytest==8.2.0",
                "add --project qluster-sdk --frozen pytest==8.2.0",
                "add --project qluster-sdk --frozen --group lint flake8==7.4.0",
                "lock",
            ]
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Running: uv lock"));
        assert!(text.contains("Workspace conflicts resolved successfully"));
    }

    #[test]
    fn test_align_with_sync() {
        let (dir, ws) = setup();
        let uv = Uv::new(ScriptedRunner::default(), dir.path());
        let mut out = Vec::new();

        align_workspace_members(&resolution(), &ws, &uv, true, &mut out).unwrap();
        assert_eq!(uv.runner().commands().last().unwrap(), "sync");
    }

    #[test]
    fn test_align_stops_on_add_failure() {
        let (dir, ws) = setup();
        let runner = ScriptedRunner::new(vec![
            CommandOutput::ok("uv 0.7.8"),
            CommandOutput::failed(2, "error: boom"),
        ]);
        let uv = Uv::new(runner, dir.path());
        let mut out = Vec::new();

        let err = align_workspace_members(&resolution(), &ws, &uv, false, &mut out).unwrap_err();
        assert!(matches!(
            err,
            RepinError::Workspace(WorkspaceError::AlignmentFailed { ref member, .. }) if member == "common"
        ));
        assert_eq!(uv.runner().commands().len(), 2);
    }

    #[test]
    fn test_align_lock_failure() {
        let (dir, ws) = setup();
        let runner = ScriptedRunner::new(vec![
            CommandOutput::ok("uv 0.7.8"),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::failed(1, "still broken"),
        ]);
        let uv = Uv::new(runner, dir.path());
        let mut out = Vec::new();

        let err = align_workspace_members(&resolution(), &ws, &uv, false, &mut out).unwrap_err();
        assert!(err.to_string().contains("Files have been modified"));
    }

    #[test]
    fn test_missing_member_defaults_to_main() {
        let dir = TempDir::new().unwrap();
        let uv = Uv::new(ScriptedRunner::default(), dir.path());
        let r = ConflictResolution::new(
            vec![WorkspaceConflict::new("flake8", "dev", &[("ghost", "7.2.0"), ("phantom", "7.3.0")])],
            BTreeMap::from([("flake8".to_string(), "7.3.0".to_string())]),
            ConflictPolicy::Max,
        );
        let mut out = Vec::new();

        align_workspace_members(&r, &Workspace::default(), &uv, false, &mut out).unwrap();
        assert_eq!(
            uv.runner().commands()[1..3],
            [
                "add --project ghost --frozen flake8==7.3.0".to_string(),
                "add --project phantom --frozen flake8==7.3.0".to_string(),
            ]
        );
    }
}
