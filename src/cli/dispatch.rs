// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Command dispatch and execution.

use crate::config::{merge_configs, tool_table, RepinConfig, VersionSourceKind};
use crate::error::{ConfigError, RepinError, Result, ResultExt};
use crate::index::{EnvironmentSource, PyPiClient, VersionSource};
use crate::project::PyProject;
use crate::repin::{RepinOptions, Repinner};
use crate::uv::{SystemRunner, Uv};
use crate::workspace::{is_ci_environment, TerminalPrompter};
use std::path::Path;

use super::args::{Cli, Commands, InitArgs};

/// Name of the file written by `uvrepin init`.
const CONFIG_FILE_NAME: &str = "uvrepin.toml";

/// Run the CLI with the given arguments.
pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None => run_repin(&cli),
        Some(Commands::Init(args)) => run_init(&cli, args),
        Some(Commands::Version) => run_version(),
    }
}

/// Resolve the effective configuration for a project.
///
/// Precedence, lowest first: defaults, config file, `[tool.uvrepin]`, flags.
fn effective_config(cli: &Cli, project: &PyProject) -> Result<RepinConfig> {
    let mut config = match &cli.config {
        Some(path) => RepinConfig::load_from(path)?,
        None => RepinConfig::load(project.dir())?,
    };

    if let Some(tool) = tool_table(project.document()) {
        tracing::debug!("Applying [tool.uvrepin] from {}", project.path().display());
        config = merge_configs(&config, tool)?;
    }

    Ok(cli.repin.apply_to(config))
}

/// Run the default repin command.
fn run_repin(cli: &Cli) -> Result<()> {
    let project = PyProject::load(&cli.project)?;
    let config = effective_config(cli, &project)?;
    tracing::debug!("Effective configuration: {:?}", config);

    let options = RepinOptions::from_config(&config, cli.repin.dry_run, cli.repin.sync, cli.repin.format);
    let uv = Uv::new(SystemRunner::new(&config.uv), project.dir());

    match config.source {
        VersionSourceKind::Pypi => {
            let client = PyPiClient::from_config(&config)?;
            repin_with(&project, &uv, &client, &options)
        }
        VersionSourceKind::Environment => {
            let source = EnvironmentSource::new(&uv);
            repin_with(&project, &uv, &source, &options)
        }
    }
}

fn repin_with(
    project: &PyProject,
    uv: &Uv<SystemRunner>,
    source: &dyn VersionSource,
    options: &RepinOptions,
) -> Result<()> {
    let prompter = TerminalPrompter;
    let stdout = std::io::stdout();

    let outcome = Repinner::new(project, uv, source, &prompter, stdout.lock())
        .ci(is_ci_environment())
        .run(options)?;

    tracing::debug!("Finished with outcome {:?}", outcome);
    Ok(())
}

/// Run the version command.
fn run_version() -> Result<()> {
    println!("uvrepin {}", crate::version::version_string());

    if let Some(sha) = crate::version::GIT_SHA {
        println!("git commit: {}", sha);
    }
    if let Some(date) = crate::version::GIT_COMMIT_DATE {
        println!("commit date: {}", date);
    }

    Ok(())
}

/// Run the init command.
fn run_init(cli: &Cli, args: &InitArgs) -> Result<()> {
    use crate::config::example_config;

    tracing::debug!("Running init command with args: {:?}", args);

    let config_path = cli.project.join(CONFIG_FILE_NAME);
    write_config(&config_path, example_config(), args.force)?;

    println!("Created {}", config_path.display());
    Ok(())
}

fn write_config(path: &Path, content: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(RepinError::Config(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        }));
    }
    std::fs::write(path, content).context(format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        write_config(&path, "pre = true\n", false).unwrap();
        let err = write_config(&path, "pre = false\n", false).unwrap_err();
        assert!(err.to_string().contains("Use --force to overwrite"));

        write_config(&path, "pre = false\n", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "pre = false\n");
    }

    #[test]
    fn test_effective_config_precedence() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "policy = \"max\"\nconcurrency = 4\nindexes = [\"https://file.example/simple\"]\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\n\n[tool.uvrepin]\nconcurrency = 2\nsource = \"environment\"\n",
        )
        .unwrap();

        let project = PyProject::load(dir.path()).unwrap();
        let cli = Cli::parse_from(["uvrepin", "--policy", "latest", "--pre"]);
        let config = effective_config(&cli, &project).unwrap();

        assert_eq!(config.concurrency, 2);
        assert_eq!(config.source, VersionSourceKind::Environment);
        assert_eq!(config.indexes, vec!["https://file.example/simple"]);
        assert_eq!(config.policy, crate::config::ConflictPolicy::Latest);
        assert!(config.pre);
    }

    #[test]
    fn test_tool_table_overrides_file_values() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "pre = true\npolicy = \"max\"\nauto_accept = true\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\n\n[tool.uvrepin]\npre = false\npolicy = \"latest\"\nauto_accept = false\n",
        )
        .unwrap();

        let project = PyProject::load(dir.path()).unwrap();
        let cli = Cli::parse_from(["uvrepin"]);
        let config = effective_config(&cli, &project).unwrap();

        assert!(!config.pre);
        assert!(!config.auto_accept);
        assert_eq!(config.policy, crate::config::ConflictPolicy::Latest);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"demo\"\n").unwrap();
        let project = PyProject::load(dir.path()).unwrap();

        let missing = dir.path().join("missing.toml");
        let cli = Cli::parse_from(["uvrepin", "--config", missing.to_str().unwrap()]);
        let err = effective_config(&cli, &project).unwrap_err();
        assert!(matches!(err, RepinError::Config(ConfigError::NotFound { .. })));
    }
}
