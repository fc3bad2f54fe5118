// file: src/cli/menu.rs
// version: 1.0.0
// guid: 4aa5c671-b2a1-44e4-9faf-b47f43fbc51b

//! Terminal front end: main menu, question prompts and the pause prompt

use crate::config::Prompter;
use crate::executor::PhaseRunRecord;
use crate::installer::{OperatorPrompt, ReconfigureScope};
use crate::{InstallerError, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

/// Entries of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    FreshInstall,
    Continue,
    Reconfigure,
    Verify,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 5] = [
        MenuChoice::FreshInstall,
        MenuChoice::Continue,
        MenuChoice::Reconfigure,
        MenuChoice::Verify,
        MenuChoice::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::FreshInstall => "Fresh installation",
            MenuChoice::Continue => "Continue a previous installation",
            MenuChoice::Reconfigure => "Reconfigure this node",
            MenuChoice::Verify => "Verify installation",
            MenuChoice::Exit => "Exit",
        }
    }
}

/// Show the main menu until a valid entry is picked
pub fn main_menu(prompter: &mut dyn Prompter, has_config: bool) -> Result<MenuChoice> {
    prompter.note(&format!("\n{}", "Cloud Node Installer".bold().cyan()));
    if !has_config {
        prompter.note("No saved node configuration; only a fresh installation is possible.");
    }
    let options: Vec<String> = MenuChoice::ALL.iter().map(|c| c.label().to_string()).collect();
    let default = if has_config { 1 } else { 0 };
    let index = prompter.choose("Select an option", &options, default)?;
    Ok(MenuChoice::ALL[index])
}

/// Ask which part of the pipeline a reconfigure should re-run
pub fn choose_scope(prompter: &mut dyn Prompter) -> Result<ReconfigureScope> {
    const SCOPES: [ReconfigureScope; 3] = [
        ReconfigureScope::NetworkOnly,
        ReconfigureScope::NetworkAndServices,
        ReconfigureScope::Full,
    ];
    let options: Vec<String> = SCOPES.iter().map(|s| s.description().to_string()).collect();
    let index = prompter.choose("What should be reconfigured", &options, 0)?;
    Ok(SCOPES[index])
}

/// [`Prompter`] over any line reader and writer; stdin/stdout in production
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InstallerError::cancelled("Input closed"));
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(value) if !value.is_empty() => {
                write!(self.output, "{} [{}]: ", prompt.bold(), value.dimmed())?
            }
            _ => write!(self.output, "{}: ", prompt.bold())?,
        }
        let answer = self.read_answer()?;
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }

    fn choose(&mut self, prompt: &str, options: &[String], default: usize) -> Result<usize> {
        loop {
            writeln!(self.output, "{}", prompt.bold())?;
            for (index, option) in options.iter().enumerate() {
                writeln!(self.output, "  {}) {}", index + 1, option)?;
            }
            write!(self.output, "Choice [{}]: ", default + 1)?;
            let answer = self.read_answer()?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(
                    self.output,
                    "{}",
                    format!("Please enter a number between 1 and {}", options.len()).yellow()
                )?,
            }
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            write!(self.output, "{} [{}]: ", prompt.bold(), hint)?;
            match self.read_answer()?.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "{}", "Please answer y or n".yellow())?,
            }
        }
    }

    fn note(&mut self, message: &str) {
        let _ = writeln!(self.output, "{}", message);
    }
}

/// Offers a pause after every phase; a closed stdin means "keep going"
pub struct InteractivePause;

impl OperatorPrompt for InteractivePause {
    fn pause_after(&self, completed: &PhaseRunRecord, next_label: &str) -> bool {
        let mut prompter = TerminalPrompter::stdio();
        prompter.note(&format!("{} {}", "✓".green(), completed.label));
        let question = format!("Continue with '{}'?", next_label);
        !prompter.confirm(&question, true).unwrap_or(true)
    }
}
