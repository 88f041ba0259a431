// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Integration with the `uv` executable.
//!
//! Every external command goes through a [`UvRunner`], which keeps the
//! orchestration testable without a real `uv` on the machine.

mod commands;
mod runner;
#[cfg(test)]
pub(crate) mod testing;

pub use commands::AddCommand;
pub use runner::{display_command, CommandOutput, SystemRunner, Uv, UvRunner};
