// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Process execution for the `uv` executable.

use crate::error::{RepinError, Result, UvError};
use std::cell::Cell;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Captured result of one `uv` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs `uv` with arguments in a working directory.
///
/// The program name is not part of `args`.
pub trait UvRunner {
    fn run(&self, args: &[String], cwd: &Path) -> Result<CommandOutput>;

    /// The executable this runner invokes.
    fn program(&self) -> String {
        "uv".to_string()
    }
}

/// Runs the real `uv` executable.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    program: PathBuf,
}

impl SystemRunner {
    /// Create a runner for the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new("uv")
    }
}

impl UvRunner for SystemRunner {
    fn run(&self, args: &[String], cwd: &Path) -> Result<CommandOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    RepinError::Uv(UvError::NotFound {
                        program: self.program(),
                    })
                } else {
                    RepinError::Uv(UvError::SpawnFailed {
                        command: display_command(args),
                        message: e.to_string(),
                    })
                }
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn program(&self) -> String {
        self.program.display().to_string()
    }
}

/// Shell-quoted rendering of a uv command line, for echoing.
pub fn display_command(args: &[String]) -> String {
    let mut words = Vec::with_capacity(args.len() + 1);
    words.push("uv".to_string());
    words.extend(args.iter().cloned());
    shell_words::join(words)
}

/// A `uv` handle bound to a project directory.
///
/// Availability is checked once, right before the first real command.
pub struct Uv<R: UvRunner> {
    runner: R,
    project_dir: PathBuf,
    checked: Cell<bool>,
}

impl<R: UvRunner> Uv<R> {
    /// Create a handle running commands from `project_dir`.
    pub fn new(runner: R, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            project_dir: project_dir.into(),
            checked: Cell::new(false),
        }
    }

    /// The directory commands run in.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// The underlying runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Verify that `uv --version` works.
    pub fn ensure_available(&self) -> Result<()> {
        if self.checked.get() {
            return Ok(());
        }

        let program = self.runner.program();
        let args = vec!["--version".to_string()];
        let available = match self.runner.run(&args, &self.project_dir) {
            Ok(output) => {
                tracing::debug!("{} version: {}", program, output.stdout.trim());
                output.success()
            }
            Err(e) => {
                tracing::debug!("{} --version failed: {}", program, e);
                false
            }
        };

        if !available {
            return Err(RepinError::Uv(UvError::NotFound { program }));
        }

        self.checked.set(true);
        Ok(())
    }

    /// Run a uv command after the availability check.
    pub fn run(&self, args: &[String]) -> Result<CommandOutput> {
        self.ensure_available()?;
        tracing::debug!("Running: {}", display_command(args));
        let output = self.runner.run(args, &self.project_dir)?;
        tracing::debug!("Exit code: {:?}", output.code);
        Ok(output)
    }

    /// `uv lock`
    pub fn lock(&self) -> Result<CommandOutput> {
        self.run(&["lock".to_string()])
    }

    /// `uv sync`
    pub fn sync(&self) -> Result<CommandOutput> {
        self.run(&["sync".to_string()])
    }

    /// `uv pip list --outdated`
    pub fn pip_list_outdated(&self) -> Result<CommandOutput> {
        self.run(&["pip".to_string(), "list".to_string(), "--outdated".to_string()])
    }
}
