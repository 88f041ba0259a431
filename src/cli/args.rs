// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! CLI argument definitions using clap.

use crate::config::{ConflictPolicy, RepinConfig, VersionSourceKind};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// uvrepin - repin direct dependencies to their latest exact versions
///
/// Rewrites every `name==version` direct dependency of a uv-managed
/// pyproject.toml through `uv add --frozen`, then runs `uv lock` once.
#[derive(Parser, Debug)]
#[command(name = "uvrepin")]
#[command(author = "Eshan Roy")]
#[command(version)]
#[command(about = "Repin pinned direct dependencies to their latest versions", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to run (defaults to repinning if not specified)
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub repin: RepinArgs,

    /// Directory containing pyproject.toml
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Options for the default repin command.
#[derive(Args, Debug, Default, Clone)]
pub struct RepinArgs {
    /// Show what would change without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Run `uv sync` after a successful lock
    #[arg(long)]
    pub sync: bool,

    /// Comma-separated groups to consider ("main" is [project.dependencies])
    #[arg(long, value_name = "GROUPS", value_delimiter = ',')]
    pub only_groups: Vec<String>,

    /// Allow pre-release versions
    #[arg(long)]
    pub pre: bool,

    /// Additional index URL passed to `uv add` (repeatable)
    #[arg(long = "index", value_name = "URL")]
    pub indexes: Vec<String>,

    /// Accept workspace conflict resolution without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Target version policy for workspace conflicts
    #[arg(long, value_enum)]
    pub policy: Option<ConflictPolicy>,

    /// Where latest versions come from
    #[arg(long, value_enum)]
    pub source: Option<VersionSourceKind>,

    /// The uv executable
    #[arg(long, value_name = "PATH", env = "UVREPIN_UV")]
    pub uv: Option<PathBuf>,

    /// Dry-run output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl RepinArgs {
    /// Layer command-line flags over a loaded configuration.
    pub fn apply_to(&self, mut config: RepinConfig) -> RepinConfig {
        let groups: Vec<String> = self
            .only_groups
            .iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        if !groups.is_empty() {
            config.only_groups = groups;
        }
        for index in &self.indexes {
            if !config.indexes.contains(index) {
                config.indexes.push(index.clone());
            }
        }
        config.pre |= self.pre;
        config.auto_accept |= self.yes;
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(ref uv) = self.uv {
            config.uv = uv.clone();
        }
        config
    }
}

/// Output format for dry runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text table (default)
    #[default]
    Text,
    /// JSON output for machine parsing
    Json,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write an example uvrepin.toml
    Init(InitArgs),

    /// Print version information
    Version,
}

/// Arguments for the init command.
#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}
