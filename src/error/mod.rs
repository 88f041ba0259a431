// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Error types for uvrepin.
//!
//! Errors are grouped by the subsystem that raised them so the CLI can
//! report a category alongside the message.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for uvrepin operations.
#[derive(Error, Debug)]
pub enum RepinError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // pyproject.toml errors
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    // uv invocation errors
    #[error("{0}")]
    Uv(#[from] UvError),

    // Package index errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // Workspace conflict errors
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // UI/Interactive errors
    #[error("UI error: {0}")]
    Ui(String),

    // Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl RepinError {
    /// Process exit code to use when this error terminates the program.
    pub fn exit_code(&self) -> i32 {
        match self {
            RepinError::Uv(UvError::CommandFailed { code: Some(code), .. }) if *code != 0 => *code,
            RepinError::Uv(UvError::AddFailed { code }) if *code != 0 => *code,
            _ => 1,
        }
    }
}

impl From<dialoguer::Error> for RepinError {
    fn from(err: dialoguer::Error) -> Self {
        RepinError::Ui(err.to_string())
    }
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to parse configuration: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration file already exists: {path}. Use --force to overwrite.")]
    AlreadyExists { path: PathBuf },
}

/// Errors reading or interpreting `pyproject.toml`.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Couldn't find {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Errors raised while driving the `uv` executable.
#[derive(Error, Debug)]
pub enum UvError {
    #[error("uv not found on PATH.")]
    NotFound { program: String },

    #[error("Failed to run `{command}`: {message}")]
    SpawnFailed { command: String, message: String },

    #[error("`{command}` failed{}", code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("One or more uv add commands failed. See output above.")]
    AddFailed { code: i32 },

    #[error("uv lock failed. pyproject.toml files have been updated but lock failed.")]
    LockFailed,

    #[error("uv sync failed. Lock succeeded but environment not synced.")]
    SyncFailed,
}

/// Package index errors.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to query PyPI for any packages. Check your network connection.")]
    NoVersions,

    #[error("Failed to build HTTP client: {message}")]
    ClientFailed { message: String },

    #[error("Invalid index URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Workspace conflict resolution errors.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Failed to align member '{member}': {message}")]
    AlignmentFailed { member: String, message: String },

    #[error("uv lock failed after alignment. Files have been modified.")]
    LockAfterAlignment,

    #[error("uv sync failed after alignment. Lock succeeded but environment may be inconsistent.")]
    SyncAfterAlignment,
}

/// Result type alias for uvrepin operations.
pub type Result<T> = std::result::Result<T, RepinError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: std::error::Error + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| RepinError::WithContext {
            context: context.into(),
            message: e.to_string(),
        })
    }
}
