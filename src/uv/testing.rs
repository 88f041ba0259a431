// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! A scripted `UvRunner` for tests.

use super::runner::{CommandOutput, UvRunner};
use crate::error::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Replays canned outputs in order and records every call.
///
/// Once the script runs out, further calls succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: RefCell<VecDeque<CommandOutput>>,
    calls: RefCell<Vec<(Vec<String>, PathBuf)>>,
}

impl ScriptedRunner {
    pub fn new(responses: Vec<CommandOutput>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Recorded calls as space-joined argument strings.
    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(args, _)| args.join(" ")).collect()
    }

    /// Recorded calls with their working directories.
    pub fn calls(&self) -> Vec<(Vec<String>, PathBuf)> {
        self.calls.borrow().clone()
    }
}

impl UvRunner for ScriptedRunner {
    fn run(&self, args: &[String], cwd: &Path) -> Result<CommandOutput> {
        self.calls.borrow_mut().push((args.to_vec(), cwd.to_path_buf()));
        Ok(self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| CommandOutput::ok("")))
    }
}
