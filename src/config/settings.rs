// file: src/config/settings.rs
// version: 1.0.0
// guid: 8484bcb6-554b-49e3-afe7-d3fccadec526

//! Installer settings: where state lives and how probes behave

use crate::Result;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Settings file name looked up inside the configuration directory
pub const SETTINGS_FILE_NAME: &str = "installer.toml";

/// Runtime settings of the installer itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSettings {
    /// Directory holding node.json, backups and the phase ledger
    pub config_dir: PathBuf,
    /// Directory holding the master log, phase logs and reports
    pub log_dir: PathBuf,
    /// Upper bound for any single probe (ping, service check, HTTP health)
    pub probe_timeout_secs: u64,
    /// Trailing window inspected for journal errors during verification
    pub journal_window_minutes: u64,
    /// Refuse to run mutating operations without root
    pub require_root: bool,
    /// Default gateway on the management VLAN
    pub management_gateway: Ipv4Addr,
    /// Host pinged for outbound connectivity
    pub connectivity_target: Ipv4Addr,
    /// Port of the control-plane API health endpoint
    pub api_port: u16,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/cloud-provider"),
            log_dir: PathBuf::from("/var/log/cloud-provider"),
            probe_timeout_secs: 3,
            journal_window_minutes: 10,
            require_root: true,
            management_gateway: Ipv4Addr::new(10, 0, 0, 1),
            connectivity_target: Ipv4Addr::new(8, 8, 8, 8),
            api_port: 8000,
        }
    }
}

impl InstallerSettings {
    /// Load settings from a TOML file, falling back to defaults for missing keys
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            crate::error::InstallerError::config(format!(
                "Failed to read settings file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let settings: InstallerSettings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Resolve settings: explicit file, else `<config_dir>/installer.toml` if present, else defaults
    pub fn resolve(explicit: Option<&Path>, config_dir: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading installer settings from {}", path.display());
            return Self::from_file(path);
        }

        let dir = config_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Self::default().config_dir);
        let candidate = dir.join(SETTINGS_FILE_NAME);
        if candidate.exists() {
            debug!("Loading installer settings from {}", candidate.display());
            Self::from_file(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Settings rooted in a scratch directory, used by dry runs and tests
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            config_dir: root.join("etc"),
            log_dir: root.join("log"),
            require_root: false,
            ..Self::default()
        }
    }

    pub fn node_config_path(&self) -> PathBuf {
        self.config_dir.join("node.json")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.config_dir.join("phase-ledger.json")
    }

    pub fn post_install_marker(&self) -> PathBuf {
        self.config_dir.join("post-install.done")
    }

    /// Verification reports live next to the logs
    pub fn reports_dir(&self) -> PathBuf {
        self.log_dir.join("reports")
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn journal_window(&self) -> Duration {
        Duration::from_secs(self.journal_window_minutes * 60)
    }
}
