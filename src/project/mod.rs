// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Python project model: requirement strings and `pyproject.toml` groups.

mod pyproject;
mod requirement;

pub use pyproject::{filter_groups, DependencyGroup, DependencyLocation, PyProject, PYPROJECT_FILE};
pub use requirement::{normalize_name, ParsedRequirement, Requirement};
