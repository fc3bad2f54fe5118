// file: src/executor.rs
// version: 3.0.0
// guid: efe39a6e-abb2-440b-82e8-8a6fa43a6ced

//! Phase executor: runs one phase as an isolated, fully logged unit

use crate::logging::{LogLayout, PhaseLog, AUDIT_TARGET};
use crate::phases::{PhaseContext, RegisteredPhase};
use crate::{InstallerError, Result};
use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Terminal status of one phase execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Record of one phase execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRunRecord {
    pub phase: String,
    pub label: String,
    pub ordinal: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// Combined output captured from the action
    pub output: String,
    pub status: RunStatus,
    pub log_path: PathBuf,
}

impl PhaseRunRecord {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// A failed record becomes the fatal error that halts the pipeline
    pub fn into_result(self) -> Result<PhaseRunRecord> {
        match self.status {
            RunStatus::Success => Ok(self),
            RunStatus::Failed => Err(InstallerError::PhaseActionFailed {
                phase: self.phase,
                log: self.log_path,
            }),
        }
    }
}

/// Runs phases and writes their logs and audit lines
pub struct PhaseExecutor {
    layout: LogLayout,
    show_progress: bool,
}

impl PhaseExecutor {
    pub fn new(layout: LogLayout) -> Self {
        Self {
            layout,
            show_progress: false,
        }
    }

    /// Show a terminal spinner while each phase runs
    pub fn set_progress(&mut self, show_progress: bool) {
        self.show_progress = show_progress;
    }

    fn spinner(&self, message: String) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    }

    pub fn layout(&self) -> &LogLayout {
        &self.layout
    }

    /// Execute a phase. The returned record carries the success/failure of
    /// the action; `Err` is reserved for failures to write the phase log.
    pub async fn execute(&self, registered: &RegisteredPhase, ctx: &PhaseContext<'_>) -> Result<PhaseRunRecord> {
        let phase = &registered.phase;
        let log_path = self.layout.phase_log(phase.name());
        let mut log = PhaseLog::open(&log_path)?;

        let started_at = Local::now();
        let clock = Instant::now();

        info!(
            target: AUDIT_TARGET,
            "[{}/{}] START phase={} session={}",
            ctx.step_number,
            ctx.total_steps,
            phase.name(),
            ctx.session_id
        );
        info!("Phase {}/{}: {}", ctx.step_number, ctx.total_steps, phase.label());
        log.start(phase.name(), phase.label(), ctx.session_id, started_at)?;

        let spinner = self.spinner(format!("{}...", phase.label()));
        let action = phase.run(ctx).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        log.output(&action.output)?;
        let finished_at = Local::now();
        let elapsed = clock.elapsed();
        log.finish(finished_at, elapsed, action.success)?;

        let status = if action.success {
            info!(
                target: AUDIT_TARGET,
                "[{}/{}] END phase={} status=success duration={:.1}s",
                ctx.step_number,
                ctx.total_steps,
                phase.name(),
                elapsed.as_secs_f64()
            );
            info!("✓ Phase '{}' completed successfully", phase.label());
            RunStatus::Success
        } else {
            error!(
                target: AUDIT_TARGET,
                "[{}/{}] END phase={} status=failed duration={:.1}s log={}",
                ctx.step_number,
                ctx.total_steps,
                phase.name(),
                elapsed.as_secs_f64(),
                log_path.display()
            );
            error!("✗ Phase '{}' failed, see {}", phase.label(), log_path.display());
            RunStatus::Failed
        };

        Ok(PhaseRunRecord {
            phase: phase.name().to_string(),
            label: phase.label().to_string(),
            ordinal: registered.ordinal,
            started_at,
            finished_at,
            output: action.output,
            status,
            log_path,
        })
    }
}
