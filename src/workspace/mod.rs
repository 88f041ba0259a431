// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! uv workspace conflict detection and alignment.
//!
//! When members of a workspace pin the same package at different versions
//! inside one extra, `uv lock` has no solution. This module recognises that
//! failure, picks a target version per package and rewrites each member.

mod align;
mod conflict;
mod members;
mod prompt;
mod resolution;

pub use align::align_workspace_members;
pub use conflict::{determine_target_versions, parse_workspace_conflicts, WorkspaceConflict};
pub use members::Workspace;
pub use prompt::{FixedAnswer, Prompter, TerminalPrompter};
pub use resolution::{is_ci_environment, is_ci_value, ConflictResolution, CI_ENV};
