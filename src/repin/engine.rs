// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! The repin flow: gather, look up, plan, apply, lock.

use console::style;
use crate::cli::args::OutputFormat;
use crate::config::{ConflictPolicy, RepinConfig};
use crate::error::{RepinError, Result, UvError};
use crate::index::VersionSource;
use crate::project::{filter_groups, PyProject};
use crate::uv::{display_command, AddCommand, Uv, UvRunner};
use crate::workspace::{
    align_workspace_members, determine_target_versions, parse_workspace_conflicts,
    ConflictResolution, Prompter, Workspace, WorkspaceConflict,
};
use std::io::Write;

use super::plan::{pinned_packages, RepinPlan};
use super::report::{render_json, render_table};

/// Settings for one repin run.
#[derive(Debug, Clone)]
pub struct RepinOptions {
    pub dry_run: bool,
    pub sync: bool,
    pub only_groups: Vec<String>,
    pub pre: bool,
    pub indexes: Vec<String>,
    pub auto_accept: bool,
    pub policy: ConflictPolicy,
    pub format: OutputFormat,
}

impl Default for RepinOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            sync: false,
            only_groups: Vec::new(),
            pre: false,
            indexes: Vec::new(),
            auto_accept: false,
            policy: ConflictPolicy::Latest,
            format: OutputFormat::Text,
        }
    }
}

impl RepinOptions {
    /// Options from an effective configuration.
    pub fn from_config(config: &RepinConfig, dry_run: bool, sync: bool, format: OutputFormat) -> Self {
        Self {
            dry_run,
            sync,
            only_groups: config.only_groups.clone(),
            pre: config.pre,
            indexes: config.indexes.clone(),
            auto_accept: config.auto_accept,
            policy: config.policy,
            format,
        }
    }

    fn json(&self) -> bool {
        self.dry_run && self.format == OutputFormat::Json
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to repin.
    NothingToDo,
    /// A dry run reported its plan.
    DryRun,
    /// Pins were updated and locked.
    Updated,
    /// A workspace conflict was resolved by alignment.
    Resolved,
    /// The user declined conflict resolution.
    Declined,
}

/// Drives one repin of a project.
pub struct Repinner<'a, R: UvRunner, W: Write> {
    project: &'a PyProject,
    uv: &'a Uv<R>,
    source: &'a dyn VersionSource,
    prompter: &'a dyn Prompter,
    ci: bool,
    out: W,
}

impl<'a, R: UvRunner, W: Write> Repinner<'a, R, W> {
    pub fn new(
        project: &'a PyProject,
        uv: &'a Uv<R>,
        source: &'a dyn VersionSource,
        prompter: &'a dyn Prompter,
        out: W,
    ) -> Self {
        Self {
            project,
            uv,
            source,
            prompter,
            ci: false,
            out,
        }
    }

    /// Treat the run as CI: conflict resolution is accepted without asking.
    pub fn ci(mut self, ci: bool) -> Self {
        self.ci = ci;
        self
    }

    /// Give back the output writer.
    pub fn into_output(self) -> W {
        self.out
    }

    fn say(&mut self, options: &RepinOptions, message: &str) -> Result<()> {
        if options.json() {
            tracing::info!("{}", message);
        } else {
            writeln!(self.out, "{}", message)?;
        }
        Ok(())
    }

    fn nothing_to_do(&mut self, options: &RepinOptions, message: &str) -> Result<Outcome> {
        self.say(options, message)?;
        if options.json() {
            writeln!(self.out, "[]")?;
        }
        Ok(Outcome::NothingToDo)
    }

    /// Run the whole flow.
    pub fn run(&mut self, options: &RepinOptions) -> Result<Outcome> {
        let groups = self.project.direct_dependencies();
        if groups.is_empty() {
            return self.nothing_to_do(options, "No direct dependencies found.");
        }

        let groups = filter_groups(groups, &options.only_groups);
        if groups.is_empty() {
            return self.nothing_to_do(options, "No matching groups after --only-groups.");
        }

        let packages = pinned_packages(&groups);
        if packages.is_empty() {
            return self.nothing_to_do(
                options,
                "No pinned dependencies (==version) found. Nothing to update.",
            );
        }

        let querying = format!(
            "Querying {} for latest versions of {} packages...",
            self.source.name(),
            packages.len()
        );
        self.say(options, &querying)?;
        let latest = self.source.latest_versions(&packages, options.pre)?;
        tracing::debug!("Resolved {} of {} packages", latest.len(), packages.len());

        let plan = RepinPlan::build(&groups, &latest);

        if options.dry_run {
            return self.report_dry_run(&plan, options);
        }

        if plan.is_empty() {
            writeln!(
                self.out,
                "All pinned dependencies are already at their latest versions. Nothing to do."
            )?;
            return Ok(Outcome::NothingToDo);
        }

        if let Some(conflicts) = self.apply(&plan, options)? {
            return self.resolve_conflicts(conflicts, options);
        }
        self.lock_and_sync(options)
    }

    fn report_dry_run(&mut self, plan: &RepinPlan, options: &RepinOptions) -> Result<Outcome> {
        if options.json() {
            writeln!(self.out, "{}", render_json(plan)?)?;
        } else if plan.is_empty() {
            writeln!(
                self.out,
                "Dry run: all pinned dependencies are already at their latest versions."
            )?;
        } else {
            write!(self.out, "{}", render_table(plan))?;
        }
        Ok(Outcome::DryRun)
    }

    /// One `uv add --frozen` per dependency list.
    ///
    /// Returns conflicts only when every failing add reports a workspace
    /// conflict; any other failure aborts the run.
    fn apply(
        &mut self,
        plan: &RepinPlan,
        options: &RepinOptions,
    ) -> Result<Option<Vec<WorkspaceConflict>>> {
        let mut failures = Vec::new();

        for (location, entries) in plan.by_location() {
            let args = AddCommand::new(location.clone())
                .frozen(true)
                .prerelease(options.pre)
                .indexes(&options.indexes)
                .specs(entries.iter().map(|e| e.new_spec()))
                .args();
            writeln!(self.out, "Running: {}", display_command(&args))?;

            let output = self.uv.run(&args)?;
            if !output.success() {
                writeln!(self.out, "Failed to update dependencies")?;
                eprint!("{}", output.stderr);
                failures.push(output);
            }
        }

        let Some(first) = failures.first() else {
            return Ok(None);
        };

        let all_conflicts = failures.iter().all(|f| {
            parse_workspace_conflicts(&f.stderr).is_some_and(|c| !c.is_empty())
        });
        if all_conflicts {
            let stderr: String = failures.iter().map(|f| f.stderr.as_str()).collect();
            if let Some(conflicts) = parse_workspace_conflicts(&stderr) {
                return Ok(Some(conflicts));
            }
        }

        Err(RepinError::Uv(UvError::AddFailed {
            code: first.code.unwrap_or(1),
        }))
    }

    fn lock_and_sync(&mut self, options: &RepinOptions) -> Result<Outcome> {
        writeln!(self.out, "Running: uv lock")?;
        let lock = self.uv.lock()?;
        if !lock.success() {
            if let Some(conflicts) =
                parse_workspace_conflicts(&lock.stderr).filter(|c| !c.is_empty())
            {
                return self.resolve_conflicts(conflicts, options);
            }
            eprint!("{}", lock.stderr);
            return Err(UvError::LockFailed.into());
        }

        if options.sync {
            writeln!(self.out, "Running: uv sync")?;
            let synced = self.uv.sync()?;
            if !synced.success() {
                eprint!("{}", synced.stderr);
                return Err(UvError::SyncFailed.into());
            }
            writeln!(
                self.out,
                "\n{}",
                style("Done. pyproject.toml updated and environment synced.").green()
            )?;
        } else {
            writeln!(
                self.out,
                "\n{}",
                style("Done. pyproject.toml updated (run `uv sync` to update environment).").green()
            )?;
        }
        Ok(Outcome::Updated)
    }

    fn resolve_conflicts(
        &mut self,
        conflicts: Vec<WorkspaceConflict>,
        options: &RepinOptions,
    ) -> Result<Outcome> {
        let workspace = Workspace::discover(self.project.dir(), self.project);
        let targets = determine_target_versions(&conflicts, options.policy, self.source, options.pre);
        let resolution = ConflictResolution::new(conflicts, targets, options.policy);

        write!(self.out, "{}", resolution.render_summary())?;

        let accepted = if options.auto_accept || self.ci {
            writeln!(self.out, "\nAuto-accepting workspace conflict resolution")?;
            true
        } else {
            self.out.flush()?;
            self.prompter.confirm(&resolution.prompt())?
        };

        if !accepted {
            write!(self.out, "{}", resolution.render_manual_help(&workspace))?;
            return Ok(Outcome::Declined);
        }

        align_workspace_members(&resolution, &workspace, self.uv, options.sync, &mut self.out)?;
        Ok(Outcome::Resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LatestVersions;
    use crate::uv::testing::ScriptedRunner;
    use crate::uv::CommandOutput;
    use crate::workspace::FixedAnswer;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct FakeSource(HashMap<&'static str, &'static str>);

    impl VersionSource for FakeSource {
        fn name(&self) -> &str {
            "PyPI"
        }

        fn latest_version(&self, package: &str, _allow_pre: bool) -> Option<String> {
            self.0.get(package).map(|v| v.to_string())
        }

        fn latest_versions(&self, packages: &[String], _allow_pre: bool) -> Result<LatestVersions> {
            Ok(packages
                .iter()
                .filter_map(|p| self.0.get(p.as_str()).map(|v| (p.clone(), v.to_string())))
                .collect())
        }
    }

    fn source() -> FakeSource {
        FakeSource(HashMap::from([
            ("requests", "2.32.3"),
            ("pytest", "8.2.0"),
            ("ruff", "0.4.0"),
            ("flake8", "7.4.0"),
        ]))
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    const SIMPLE: &str = r#"
[project]
name = "demo"
dependencies = ["requests==2.28.1", "click>=8"]

[project.optional-dependencies]
dev = ["pytest==7.4.0"]

[dependency-groups]
lint = ["ruff==0.4.0"]
"#;

    struct Run {
        outcome: Result<Outcome>,
        output: String,
        commands: Vec<String>,
    }

    fn run_with(content: &str, responses: Vec<CommandOutput>, options: RepinOptions, answer: bool) -> Run {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pyproject.toml", content);
        run_in(dir.path(), responses, options, answer)
    }

    fn run_in(dir: &Path, responses: Vec<CommandOutput>, options: RepinOptions, answer: bool) -> Run {
        run_in_env(dir, responses, options, answer, false)
    }

    fn run_in_env(
        dir: &Path,
        responses: Vec<CommandOutput>,
        options: RepinOptions,
        answer: bool,
        ci: bool,
    ) -> Run {
        let project = PyProject::load(dir).unwrap();
        let uv = Uv::new(ScriptedRunner::new(responses), dir);
        let source = source();
        let prompter = FixedAnswer(answer);

        let mut repinner = Repinner::new(&project, &uv, &source, &prompter, Vec::new()).ci(ci);
        let outcome = repinner.run(&options);
        let output = String::from_utf8(repinner.into_output()).unwrap();
        Run {
            outcome,
            output,
            commands: uv.runner().commands(),
        }
    }

    #[test]
    fn test_no_direct_dependencies() {
        let run = run_with("[project]\nname = \"x\"\n", vec![], RepinOptions::default(), false);
        assert_eq!(run.outcome.unwrap(), Outcome::NothingToDo);
        assert!(run.output.contains("No direct dependencies found."));
        assert!(run.commands.is_empty());
    }

    #[test]
    fn test_no_pinned_dependencies() {
        let run = run_with(
            "[project]\ndependencies = [\"requests>=2\"]\n",
            vec![],
            RepinOptions::default(),
            false,
        );
        assert_eq!(run.outcome.unwrap(), Outcome::NothingToDo);
        assert!(run
            .output
            .contains("No pinned dependencies (==version) found. Nothing to update."));
    }

    #[test]
    fn test_only_groups_without_match() {
        let options = RepinOptions {
            only_groups: vec!["docs".into()],
            ..Default::default()
        };
        let run = run_with(SIMPLE, vec![], options, false);
        assert_eq!(run.outcome.unwrap(), Outcome::NothingToDo);
        assert!(run.output.contains("No matching groups after --only-groups."));
    }

    #[test]
    fn test_dry_run_does_not_touch_uv() {
        let options = RepinOptions {
            dry_run: true,
            ..Default::default()
        };
        let run = run_with(SIMPLE, vec![], options, false);
        assert_eq!(run.outcome.unwrap(), Outcome::DryRun);
        assert!(run
            .output
            .contains("Querying PyPI for latest versions of 3 packages..."));
        assert!(run.output.contains("Dry run — would update these direct dependencies:"));
        assert!(run.output.contains("requests"));
        assert!(!run.output.contains("ruff"));
        assert!(run.output.contains("(No files changed.)"));
        assert!(run.commands.is_empty());
    }

    #[test]
    fn test_dry_run_json() {
        let options = RepinOptions {
            dry_run: true,
            format: OutputFormat::Json,
            ..Default::default()
        };
        let run = run_with(SIMPLE, vec![], options, false);
        let value: serde_json::Value = serde_json::from_str(&run.output).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_dry_run_up_to_date() {
        let options = RepinOptions {
            dry_run: true,
            only_groups: vec!["lint".into()],
            ..Default::default()
        };
        let run = run_with(SIMPLE, vec![], options, false);
        assert!(run
            .output
            .contains("Dry run: all pinned dependencies are already at their latest versions."));
    }

    #[test]
    fn test_nothing_to_do() {
        let options = RepinOptions {
            only_groups: vec!["lint".into()],
            ..Default::default()
        };
        let run = run_with(SIMPLE, vec![], options, false);
        assert_eq!(run.outcome.unwrap(), Outcome::NothingToDo);
        assert!(run.output.contains("Nothing to do."));
        assert!(run.commands.is_empty());
    }

    #[test]
    fn test_update_runs_add_per_group_then_lock() {
        let options = RepinOptions {
            pre: true,
            indexes: vec!["https://example.com/simple".into()],
            ..Default::default()
        };
        let run = run_with(SIMPLE, vec![], options, false);
        assert_eq!(run.outcome.unwrap(), Outcome::Updated);
        assert_eq!(
            run.commands,
            vec![
                "--version",
                "add --frozen --prerelease always --index https://example.com/simple requests==2.32.3",
                "add --frozen --optional dev --prerelease always --index https://example.com/simple pytest==8.2.0",
                "lock",
            ]
        );
        assert!(run.output.contains("Running: uv lock"));
        assert!(run
            .output
            .contains("Done. pyproject.toml updated (run `uv sync` to update environment)."));
    }

    #[test]
    fn test_update_with_sync() {
        let options = RepinOptions {
            sync: true,
            ..Default::default()
        };
        let run = run_with(SIMPLE, vec![], options, false);
        assert_eq!(run.commands.last().unwrap(), "sync");
        assert!(run
            .output
            .contains("Done. pyproject.toml updated and environment synced."));
    }

    #[test]
    fn test_add_failure_continues_then_errors() {
        let responses = vec![
            CommandOutput::ok("uv 0.7.8"),
            CommandOutput::failed(2, "error: network"),
            CommandOutput::ok(""),
        ];
        let run = run_with(SIMPLE, responses, RepinOptions::default(), false);
        let err = run.outcome.unwrap_err();
        assert_eq!(err.to_string(), "One or more uv add commands failed. See output above.");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(run.commands.len(), 3);
        assert!(run.output.contains("Failed to update dependencies"));
    }

    #[test]
    fn test_lock_failure_without_conflict() {
        let responses = vec![
            CommandOutput::ok("uv 0.7.8"),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::failed(1, "error: something else"),
        ];
        let run = run_with(SIMPLE, responses, RepinOptions::default(), false);
        let err = run.outcome.unwrap_err();
        assert!(matches!(err, RepinError::Uv(UvError::LockFailed)));
    }

    #[test]
    fn test_sync_failure() {
        let options = RepinOptions {
            sync: true,
            ..Default::default()
        };
        let responses = vec![
            CommandOutput::ok("uv 0.7.8"),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::failed(1, "error: sync"),
        ];
        let run = run_with(SIMPLE, responses, options, false);
        assert!(matches!(run.outcome.unwrap_err(), RepinError::Uv(UvError::SyncFailed)));
    }

    #[test]
    fn test_uv_missing() {
        let responses = vec![CommandOutput::failed(127, "")];
        let run = run_with(SIMPLE, responses, RepinOptions::default(), false);
        assert_eq!(run.outcome.unwrap_err().to_string(), "uv not found on PATH.");
    }

    const CONFLICT: &str = "No solution found when resolving dependencies:
  Because common[dev] depends on flake8==7.2.0 and qluster-sdk[dev] depends on flake8==7.3.0, we can resolve the conflict.
";

    fn conflict_workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "pyproject.toml",
            r#"
[project]
name = "root"
dependencies = ["requests==2.28.1"]

[tool.uv.workspace]
members = ["packages/*"]
"#,
        );
        write(
            dir.path(),
            "packages/common/pyproject.toml",
            "[project]\nname = \"common\"\n\n[project.optional-dependencies]\ndev = [\"flake8==7.2.0\"]\n",
        );
        write(
            dir.path(),
            "packages/qluster_sdk/pyproject.toml",
            "[project]\nname = \"qluster-sdk\"\n\n[project.optional-dependencies]\ndev = [\"flake8==7.3.0\"]\n",
        );
        dir
    }

    fn conflict_responses() -> Vec<CommandOutput> {
        vec![
            CommandOutput::ok("uv 0.7.8"),
            CommandOutput::ok(""),
            CommandOutput::failed(1, CONFLICT),
        ]
    }

    #[test]
    fn test_conflict_accepted_aligns_members() {
        let dir = conflict_workspace();
        let run = run_in(dir.path(), conflict_responses(), RepinOptions::default(), true);

        assert_eq!(run.outcome.unwrap(), Outcome::Resolved);
        assert!(run
            .output
            .contains("Conflicts detected in extra \"dev\" across 2 members:"));
        assert!(run
            .output
            .contains("  flake8: common(==7.2.0) ↔ qluster-sdk(==7.3.0) → 7.4.0"));
        assert!(run.output.contains("Workspace conflicts resolved successfully"));
        assert_eq!(
            run.commands[3..],
            [
                "add --project packages/common --frozen --optional dev flake8==7.4.0".to_string(),
                "add --project packages/qluster_sdk --frozen --optional dev flake8==7.4.0".to_string(),
                "lock".to_string(),
            ]
        );
    }

    #[test]
    fn test_conflict_declined_prints_manual_help() {
        let dir = conflict_workspace();
        let run = run_in(dir.path(), conflict_responses(), RepinOptions::default(), false);

        assert_eq!(run.outcome.unwrap(), Outcome::Declined);
        assert!(run.output.contains("To manually resolve these conflicts"));
        assert!(run
            .output
            .contains("uv add --project packages/common --optional dev flake8==7.4.0"));
        assert!(run.output.contains("Then run: uv lock"));
        assert_eq!(run.commands.len(), 3);
    }

    #[test]
    fn test_conflict_auto_accept_with_max_policy() {
        let dir = conflict_workspace();
        let options = RepinOptions {
            auto_accept: true,
            policy: ConflictPolicy::Max,
            ..Default::default()
        };
        let run = run_in(dir.path(), conflict_responses(), options, false);

        assert_eq!(run.outcome.unwrap(), Outcome::Resolved);
        assert!(run.output.contains("Auto-accepting workspace conflict resolution"));
        assert!(run.commands.contains(
            &"add --project packages/common --frozen --optional dev flake8==7.3.0".to_string()
        ));
    }

    #[test]
    fn test_conflict_reported_by_add() {
        let dir = conflict_workspace();
        let responses = vec![CommandOutput::ok("uv 0.7.8"), CommandOutput::failed(1, CONFLICT)];
        let options = RepinOptions {
            auto_accept: true,
            ..Default::default()
        };
        let run = run_in(dir.path(), responses, options, false);

        assert_eq!(run.outcome.unwrap(), Outcome::Resolved);
        assert_eq!(run.commands.last().unwrap(), "lock");
    }

    #[test]
    fn test_add_failure_not_masked_by_conflict() {
        let dir = conflict_workspace();
        write(
            dir.path(),
            "pyproject.toml",
            r#"
[project]
name = "root"
dependencies = ["requests==2.28.1"]

[project.optional-dependencies]
dev = ["pytest==7.4.0"]

[tool.uv.workspace]
members = ["packages/*"]
"#,
        );
        let responses = vec![
            CommandOutput::ok("uv 0.7.8"),
            CommandOutput::failed(2, "error: network unreachable"),
            CommandOutput::failed(1, CONFLICT),
        ];
        let options = RepinOptions {
            auto_accept: true,
            ..Default::default()
        };
        let run = run_in(dir.path(), responses, options, true);

        let err = run.outcome.unwrap_err();
        assert!(matches!(err, RepinError::Uv(UvError::AddFailed { code: 2 })));
        assert_eq!(run.commands.len(), 3);
        assert!(!run.commands.contains(&"lock".to_string()));
        assert!(!run.output.contains("Conflicts detected"));
    }

    #[test]
    fn test_ci_accepts_conflict_resolution() {
        let dir = conflict_workspace();
        let run = run_in_env(dir.path(), conflict_responses(), RepinOptions::default(), false, true);

        assert_eq!(run.outcome.unwrap(), Outcome::Resolved);
        assert_eq!(
            run.commands[3..],
            [
                "add --project packages/common --frozen --optional dev flake8==7.4.0".to_string(),
                "add --project packages/qluster_sdk --frozen --optional dev flake8==7.4.0".to_string(),
                "lock".to_string(),
            ]
        );
    }

    #[test]
    fn test_ci_announces_auto_accept() {
        let dir = conflict_workspace();
        let run = run_in_env(dir.path(), conflict_responses(), RepinOptions::default(), false, true);

        assert!(run.output.contains("Auto-accepting workspace conflict resolution"));
        assert!(!run.output.contains("To manually resolve these conflicts"));
    }
}
