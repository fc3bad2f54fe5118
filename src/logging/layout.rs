// file: src/logging/layout.rs
// version: 1.0.0
// guid: 518f6973-ec7e-4a47-be5d-144c93011696

//! Where each log artifact lives under the log directory

use crate::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem layout of the log directory for one invocation
#[derive(Debug, Clone)]
pub struct LogLayout {
    root: PathBuf,
    stamp: String,
}

impl LogLayout {
    pub fn new<P: Into<PathBuf>>(root: P, started: DateTime<Local>) -> Self {
        Self {
            root: root.into(),
            stamp: started.format("%Y%m%d-%H%M%S").to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Master log for this invocation: `install-YYYYmmdd-HHMMSS.log`
    pub fn master_log(&self) -> PathBuf {
        self.root.join(format!("install-{}.log", self.stamp))
    }

    pub fn phases_dir(&self) -> PathBuf {
        self.root.join("phases")
    }

    /// Per-phase log shared by every run of that phase
    pub fn phase_log(&self, phase: &str) -> PathBuf {
        self.phases_dir().join(format!("{}.log", phase))
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Create every directory in the layout
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(self.phases_dir())?;
        fs::create_dir_all(self.reports_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_paths() {
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let layout = LogLayout::new("/var/log/cloud-provider", started);

        assert_eq!(
            layout.master_log(),
            PathBuf::from("/var/log/cloud-provider/install-20240309-140507.log")
        );
        assert_eq!(
            layout.phase_log("network"),
            PathBuf::from("/var/log/cloud-provider/phases/network.log")
        );
        assert_eq!(layout.reports_dir(), PathBuf::from("/var/log/cloud-provider/reports"));
    }

    #[test]
    fn test_ensure_creates_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = LogLayout::new(dir.path(), Local::now());

        layout.ensure()?;

        assert!(layout.phases_dir().is_dir());
        assert!(layout.reports_dir().is_dir());
        Ok(())
    }
}
