// file: src/phases/script.rs
// version: 1.0.0
// guid: a5002247-774c-4d53-8aca-e7beafb02cca

//! Sequential shell steps with a captured transcript

use super::ActionOutput;
use crate::host::CommandRunner;
use anyhow::{bail, Context, Result};
use tracing::debug;

/// Runs shell steps in order, stopping at the first failure
pub struct Script<'a> {
    runner: &'a dyn CommandRunner,
    transcript: String,
}

impl<'a> Script<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            transcript: String::new(),
        }
    }

    /// Run one step; a non-zero exit aborts the script
    pub async fn step(&mut self, description: &str, command: &str) -> Result<String> {
        debug!("{}: {}", description, command);
        self.transcript.push_str(&format!("==> {}\n$ {}\n", description, command));

        let output = self
            .runner
            .run(command, None)
            .await
            .with_context(|| format!("{} could not be started", description))?;

        let text = output.combined();
        self.transcript.push_str(&text);
        if !text.is_empty() && !text.ends_with('\n') {
            self.transcript.push('\n');
        }

        if !output.success() {
            bail!("{} failed with exit code {}", description, output.exit_code);
        }
        Ok(output.stdout)
    }

    /// Add a free-form line to the transcript
    pub fn note(&mut self, text: &str) {
        self.transcript.push_str(text);
        self.transcript.push('\n');
    }

    /// Close the script into an action outcome
    pub fn finish(self, result: Result<()>) -> ActionOutput {
        ActionOutput::from_result(self.transcript, result)
    }
}
