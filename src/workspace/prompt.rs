// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Yes/no confirmation.

use crate::error::Result;
use dialoguer::{theme::ColorfulTheme, Confirm};

/// Asks the user a yes/no question.
pub trait Prompter {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Prompts on the terminal, defaulting to "no".
///
/// Without an attended terminal the answer is "no".
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        if !console::user_attended() {
            tracing::debug!("No terminal attached, declining: {}", prompt);
            return Ok(false);
        }

        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(answer)
    }
}

/// Gives the same answer every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompter for FixedAnswer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        tracing::debug!("{} -> {}", prompt, self.0);
        Ok(self.0)
    }
}
