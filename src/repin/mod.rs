// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Repinning direct dependencies.
//!
//! The [`Repinner`] gathers pinned dependencies, asks a version source for
//! the newest releases, and rewrites the pins through `uv add --frozen`
//! followed by a single `uv lock`.

mod engine;
mod plan;
mod report;

pub use engine::{Outcome, RepinOptions, Repinner};
pub use plan::{pinned_packages, PlanEntry, RepinPlan};
pub use report::{render_json, render_table};
