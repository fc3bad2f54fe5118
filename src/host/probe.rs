// file: src/host/probe.rs
// version: 1.0.0
// guid: 0a493b11-664b-40d5-9974-6acad0f28de8

//! Read-only probes of live host state
//!
//! Every probe is bounded by a timeout; a timed-out probe is reported as
//! [`ProbeOutcome::TimedOut`] and never retried.

use super::runner::CommandRunner;
use crate::utils::system::{OsRelease, SystemUtils};
use crate::InstallerError;
use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Disks, System};
use tracing::debug;

/// Result of a single liveness/reachability probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Up,
    Down(String),
    TimedOut(Duration),
}

impl ProbeOutcome {
    pub fn is_up(&self) -> bool {
        matches!(self, ProbeOutcome::Up)
    }

    /// Short description for reports
    pub fn describe(&self) -> String {
        match self {
            ProbeOutcome::Up => "up".to_string(),
            ProbeOutcome::Down(reason) => reason.clone(),
            ProbeOutcome::TimedOut(limit) => format!("timed out after {}s", limit.as_secs_f32()),
        }
    }
}

/// Point-in-time resource picture of the host
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSnapshot {
    pub kernel: String,
    pub total_memory_gb: f64,
    pub root_disk_total_gb: f64,
    pub root_disk_available_gb: f64,
    pub cpu_virtualization: bool,
    pub os: Option<OsRelease>,
}

/// Error/warning line counts from the system journal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCounts {
    pub errors: u64,
    pub warnings: u64,
}

/// Read-only view of the host used by phase probes and verification
#[async_trait::async_trait]
pub trait HostProbe: Send + Sync {
    /// IPv4 addresses of an interface, or `None` if the interface does not exist
    async fn interface_addresses(&self, name: &str) -> Option<Vec<Ipv4Addr>>;

    /// systemd unit liveness
    async fn service_active(&self, unit: &str) -> ProbeOutcome;

    /// Single ICMP echo to `address`
    async fn ping(&self, address: Ipv4Addr) -> ProbeOutcome;

    /// HTTP GET that must answer with a success status
    async fn http_health(&self, url: &str) -> ProbeOutcome;

    /// Arbitrary read-only shell check
    async fn command_succeeds(&self, command: &str) -> ProbeOutcome;

    async fn system_snapshot(&self) -> SystemSnapshot;

    /// Journal error/warning counts over the trailing `window`
    async fn recent_log_counts(&self, window: Duration) -> Option<LogCounts>;

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Probes the machine the installer runs on
pub struct LiveHost {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    http: reqwest::Client,
}

impl LiveHost {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            runner,
            timeout,
            http,
        }
    }

    async fn shell_outcome(&self, command: &str) -> ProbeOutcome {
        match self.runner.run(command, Some(self.timeout)).await {
            Ok(output) if output.success() => ProbeOutcome::Up,
            Ok(output) => {
                let text = output.combined();
                let reason = text.lines().next().unwrap_or("").trim();
                if reason.is_empty() {
                    ProbeOutcome::Down(format!("exit code {}", output.exit_code))
                } else {
                    ProbeOutcome::Down(reason.to_string())
                }
            }
            Err(InstallerError::ProbeTimeout { timeout, .. }) => ProbeOutcome::TimedOut(timeout),
            Err(e) => ProbeOutcome::Down(e.to_string()),
        }
    }

    async fn journal_count(&self, priority: &str, window: Duration) -> Option<u64> {
        let command = format!(
            "journalctl --no-pager -q -o cat --since '-{}s' -p {} | wc -l",
            window.as_secs(),
            priority
        );
        let output = self.runner.run(&command, Some(self.timeout)).await.ok()?;
        output.stdout.trim().parse().ok()
    }
}

#[async_trait::async_trait]
impl HostProbe for LiveHost {
    async fn interface_addresses(&self, name: &str) -> Option<Vec<Ipv4Addr>> {
        let interfaces = NetworkInterface::show().ok()?;
        let matching: Vec<NetworkInterface> = interfaces.into_iter().filter(|i| i.name == name).collect();
        if matching.is_empty() {
            return None;
        }
        Some(
            matching
                .into_iter()
                .flat_map(|iface| iface.addr.into_iter())
                .filter_map(|addr| match addr.ip() {
                    IpAddr::V4(v4) => Some(v4),
                    IpAddr::V6(_) => None,
                })
                .collect(),
        )
    }

    async fn service_active(&self, unit: &str) -> ProbeOutcome {
        let command = format!("systemctl is-active {}", unit);
        match self.runner.run(&command, Some(self.timeout)).await {
            Ok(output) => {
                let state = output.stdout.trim().to_string();
                if state == "active" {
                    ProbeOutcome::Up
                } else if state.is_empty() {
                    ProbeOutcome::Down("unknown".to_string())
                } else {
                    ProbeOutcome::Down(state)
                }
            }
            Err(InstallerError::ProbeTimeout { timeout, .. }) => ProbeOutcome::TimedOut(timeout),
            Err(e) => ProbeOutcome::Down(e.to_string()),
        }
    }

    async fn ping(&self, address: Ipv4Addr) -> ProbeOutcome {
        let wait = self.timeout.as_secs().max(1);
        self.shell_outcome(&format!("ping -c 1 -W {} {}", wait, address)).await
    }

    async fn http_health(&self, url: &str) -> ProbeOutcome {
        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Up,
            Ok(response) => ProbeOutcome::Down(format!("HTTP {}", response.status())),
            Err(e) if e.is_timeout() => ProbeOutcome::TimedOut(self.timeout),
            Err(e) => ProbeOutcome::Down(e.to_string()),
        }
    }

    async fn command_succeeds(&self, command: &str) -> ProbeOutcome {
        self.shell_outcome(command).await
    }

    async fn system_snapshot(&self) -> SystemSnapshot {
        let mut sys = System::new();
        sys.refresh_memory();

        let disks = Disks::new_with_refreshed_list();
        let root = disks.list().iter().find(|d| d.mount_point() == Path::new("/"));

        let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").unwrap_or_default();

        let snapshot = SystemSnapshot {
            kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            total_memory_gb: bytes_to_gb(sys.total_memory()),
            root_disk_total_gb: root.map(|d| bytes_to_gb(d.total_space())).unwrap_or(0.0),
            root_disk_available_gb: root.map(|d| bytes_to_gb(d.available_space())).unwrap_or(0.0),
            cpu_virtualization: SystemUtils::cpu_virtualization_flags(&cpuinfo),
            os: SystemUtils::os_release(),
        };
        debug!("System snapshot: {:?}", snapshot);
        snapshot
    }

    async fn recent_log_counts(&self, window: Duration) -> Option<LogCounts> {
        let errors = self.journal_count("err", window).await?;
        // `-p warning` includes every more severe priority
        let at_least_warning = self.journal_count("warning", window).await?;
        Some(LogCounts {
            errors,
            warnings: at_least_warning.saturating_sub(errors),
        })
    }
}

fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0 / 1024.0
}
