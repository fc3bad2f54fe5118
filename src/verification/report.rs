// file: src/verification/report.rs
// version: 1.0.0
// guid: de5f55c1-80c2-421b-879a-bdbf1a2dcd3d

//! Verification report model and artifact writing

use crate::config::NodeRole;
use crate::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Classification of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        };
        f.write_str(text)
    }
}

/// Group a check belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckTier {
    System,
    Network,
    Services,
    Functional,
    Logs,
}

impl CheckTier {
    pub const ALL: [CheckTier; 5] = [
        CheckTier::System,
        CheckTier::Network,
        CheckTier::Services,
        CheckTier::Functional,
        CheckTier::Logs,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            CheckTier::System => "System",
            CheckTier::Network => "Network",
            CheckTier::Services => "Services",
            CheckTier::Functional => "Functional",
            CheckTier::Logs => "Recent Logs",
        }
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub tier: CheckTier,
    pub name: String,
    /// What was actually observed on the host
    pub observed: String,
    pub status: CheckStatus,
}

impl CheckResult {
    pub fn new(tier: CheckTier, name: impl Into<String>, observed: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            tier,
            name: name.into(),
            observed: observed.into(),
            status,
        }
    }
}

/// Aggregate classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Pass,
    Fail,
}

/// Journal error/warning counts over the trailing observation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalSummary {
    pub window_minutes: u64,
    pub errors: u64,
    pub warnings: u64,
}

/// Immutable result of one verification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    generated_at: DateTime<Local>,
    hostname: String,
    role: NodeRole,
    checks: Vec<CheckResult>,
    journal: Option<JournalSummary>,
    errors: usize,
    warnings: usize,
    overall: OverallStatus,
}

impl VerificationReport {
    pub fn new(
        hostname: impl Into<String>,
        role: NodeRole,
        checks: Vec<CheckResult>,
        journal: Option<JournalSummary>,
    ) -> Self {
        let errors = checks.iter().filter(|c| c.status == CheckStatus::Fail).count();
        let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warn).count();
        let overall = if errors > 0 {
            OverallStatus::Fail
        } else {
            OverallStatus::Pass
        };

        Self {
            generated_at: Local::now(),
            hostname: hostname.into(),
            role,
            checks,
            journal,
            errors,
            warnings,
            overall,
        }
    }

    pub fn generated_at(&self) -> DateTime<Local> {
        self.generated_at
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    /// Checks of one tier, in execution order
    pub fn tier(&self, tier: CheckTier) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(move |c| c.tier == tier)
    }

    pub fn journal(&self) -> Option<JournalSummary> {
        self.journal
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn passed_count(&self) -> usize {
        self.checks.len() - self.errors - self.warnings
    }

    pub fn overall(&self) -> OverallStatus {
        self.overall
    }

    pub fn passed(&self) -> bool {
        self.overall == OverallStatus::Pass
    }

    /// Plain-text report as written to the `.txt` artifact
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Cloud Node Verification Report");
        let _ = writeln!(out, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S %Z"));
        let _ = writeln!(out, "Hostname:  {}", self.hostname);
        let _ = writeln!(out, "Role:      {}", self.role);

        for tier in CheckTier::ALL {
            let mut checks = self.tier(tier).peekable();
            if checks.peek().is_none() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "[{}]", tier.title());
            for check in checks {
                let _ = writeln!(out, "  [{}] {:<32} {}", check.status, check.name, check.observed);
            }
        }

        if let Some(journal) = &self.journal {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Journal (last {} minutes): {} errors, {} warnings",
                journal.window_minutes, journal.errors, journal.warnings
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Summary: {} passed, {} warnings, {} errors",
            self.passed_count(),
            self.warnings,
            self.errors
        );
        let _ = writeln!(
            out,
            "Overall: {}",
            match self.overall {
                OverallStatus::Pass => "PASS",
                OverallStatus::Fail => "FAIL",
            }
        );
        out
    }

    /// Write `verification-<timestamp>.txt` and its `.json` twin into `dir`.
    ///
    /// Artifacts are created with create-new semantics; an existing report is
    /// never overwritten. Both files are created before either is written, and
    /// neither is left behind on error.
    pub fn write_artifacts(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let stamp = self.generated_at.format("%Y%m%d-%H%M%S").to_string();
        let json = serde_json::to_string_pretty(self)?;
        let text = self.render_text();

        for attempt in 0u32..1000 {
            let stem = if attempt == 0 {
                format!("verification-{}", stamp)
            } else {
                format!("verification-{}-{}", stamp, attempt)
            };
            let text_path = dir.join(format!("{}.txt", stem));
            let json_path = dir.join(format!("{}.json", stem));

            let mut text_file = match create_new(&text_path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            let mut json_file = match create_new(&json_path) {
                Ok(file) => file,
                Err(e) => {
                    let _ = fs::remove_file(&text_path);
                    if e.kind() == ErrorKind::AlreadyExists {
                        continue;
                    }
                    return Err(e.into());
                }
            };

            let written = write_synced(&mut text_file, &text).and_then(|_| write_synced(&mut json_file, &json));
            if let Err(e) = written {
                let _ = fs::remove_file(&text_path);
                let _ = fs::remove_file(&json_path);
                return Err(e.into());
            }
            return Ok(text_path);
        }

        Err(crate::InstallerError::execution(format!(
            "No free report name in {}",
            dir.display()
        )))
    }
}

fn create_new(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

fn write_synced(file: &mut fs::File, content: &str) -> std::io::Result<()> {
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
