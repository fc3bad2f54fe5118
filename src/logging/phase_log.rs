// file: src/logging/phase_log.rs
// version: 1.0.0
// guid: 1469626e-0b61-40a7-adda-77814ed093ed

//! Append-only per-phase log file

use crate::Result;
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

const RULE: &str = "========================================";

/// An open phase log; every run appends a banner, the output and a footer
pub struct PhaseLog {
    path: PathBuf,
    file: File,
}

impl PhaseLog {
    /// Open (creating if needed) the log in append mode
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start(&mut self, name: &str, label: &str, session: Uuid, started: DateTime<Local>) -> Result<()> {
        writeln!(self.file, "{}", RULE)?;
        writeln!(self.file, "PHASE: {} ({})", label, name)?;
        writeln!(self.file, "SESSION: {}", session)?;
        writeln!(self.file, "START: {}", started.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(self.file, "{}", RULE)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn output(&mut self, text: &str) -> Result<()> {
        self.file.write_all(text.as_bytes())?;
        if !text.is_empty() && !text.ends_with('\n') {
            writeln!(self.file)?;
        }
        self.file.flush()?;
        Ok(())
    }

    pub fn finish(&mut self, finished: DateTime<Local>, elapsed: Duration, success: bool) -> Result<()> {
        writeln!(self.file, "{}", RULE)?;
        writeln!(self.file, "END: {}", finished.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(self.file, "DURATION: {:.1}s", elapsed.as_secs_f64())?;
        writeln!(self.file, "STATUS: {}", if success { "SUCCESS" } else { "FAILED" })?;
        writeln!(self.file, "{}", RULE)?;
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_run(path: &Path, output: &str, success: bool) -> Result<()> {
        let mut log = PhaseLog::open(path)?;
        log.start("network", "Network Configuration", Uuid::new_v4(), Local::now())?;
        log.output(output)?;
        log.finish(Local::now(), Duration::from_millis(1500), success)
    }

    #[test]
    fn test_runs_are_appended() -> Result<()> {
        // Arrange
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("phases").join("network.log");

        // Act
        write_run(&path, "first attempt", false)?;
        write_run(&path, "second attempt\n", true)?;

        // Assert
        let content = fs::read_to_string(&path)?;
        assert_eq!(content.matches("PHASE: Network Configuration (network)").count(), 2);
        let first = content.find("first attempt").unwrap();
        let second = content.find("second attempt").unwrap();
        assert!(first < second);
        assert!(content.contains("STATUS: FAILED"));
        assert!(content.contains("STATUS: SUCCESS"));
        assert!(content.contains("DURATION: 1.5s"));
        Ok(())
    }
}
