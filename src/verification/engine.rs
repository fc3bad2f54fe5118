// file: src/verification/engine.rs
// version: 1.0.0
// guid: 68eaa8f3-a127-44a9-a172-ca0e679c5058

//! Check battery run against the live host

use super::report::{CheckResult, CheckStatus, CheckTier, JournalSummary, VerificationReport};
use crate::config::{segments_for_role, InstallerSettings, NetworkSegment, NodeConfig};
use crate::host::{HostProbe, ProbeOutcome};
use tracing::{debug, info};

/// Minimum free share of the root filesystem before a warning is raised
const MIN_FREE_DISK_RATIO: f64 = 0.10;

/// Runs the system, network, services and functional tiers for a node
pub struct VerificationEngine<'a> {
    host: &'a dyn HostProbe,
    config: &'a NodeConfig,
    settings: &'a InstallerSettings,
}

impl<'a> VerificationEngine<'a> {
    pub fn new(host: &'a dyn HostProbe, config: &'a NodeConfig, settings: &'a InstallerSettings) -> Self {
        Self { host, config, settings }
    }

    /// Run every check and build the report. Never fails; problems are
    /// classified, not raised.
    pub async fn run(&self) -> VerificationReport {
        info!("Verifying {} node {}", self.config.role, self.config.hostname);

        let mut checks = Vec::new();
        checks.extend(self.system_checks().await);
        checks.extend(self.network_checks().await);
        checks.extend(self.service_checks().await);
        checks.extend(self.functional_checks().await);

        let journal = self.journal_check(&mut checks).await;

        let report = VerificationReport::new(self.config.hostname.clone(), self.config.role, checks, journal);
        info!(
            "Verification finished: {} errors, {} warnings",
            report.error_count(),
            report.warning_count()
        );
        report
    }

    async fn system_checks(&self) -> Vec<CheckResult> {
        let snapshot = self.host.system_snapshot().await;
        let role = self.config.role;
        let mut checks = Vec::new();

        let kernel_status = if snapshot.kernel == "unknown" || snapshot.kernel.is_empty() {
            CheckStatus::Warn
        } else {
            CheckStatus::Pass
        };
        checks.push(CheckResult::new(CheckTier::System, "Kernel", snapshot.kernel.clone(), kernel_status));

        let memory_status = if snapshot.total_memory_gb + 0.5 >= role.min_memory_gb() as f64 {
            CheckStatus::Pass
        } else {
            CheckStatus::Warn
        };
        checks.push(CheckResult::new(
            CheckTier::System,
            "Memory",
            format!("{:.1} GB (>= {} GB recommended)", snapshot.total_memory_gb, role.min_memory_gb()),
            memory_status,
        ));

        let (disk_observed, disk_status) = if snapshot.root_disk_total_gb <= 0.0 {
            ("root filesystem not found".to_string(), CheckStatus::Warn)
        } else {
            let ratio = snapshot.root_disk_available_gb / snapshot.root_disk_total_gb;
            let status = if ratio >= MIN_FREE_DISK_RATIO {
                CheckStatus::Pass
            } else {
                CheckStatus::Warn
            };
            (
                format!(
                    "{:.1} GB free of {:.1} GB ({:.0}%)",
                    snapshot.root_disk_available_gb,
                    snapshot.root_disk_total_gb,
                    ratio * 100.0
                ),
                status,
            )
        };
        checks.push(CheckResult::new(CheckTier::System, "Root disk headroom", disk_observed, disk_status));

        if role.runs_virtualization() {
            checks.push(CheckResult::new(
                CheckTier::System,
                "CPU virtualization",
                if snapshot.cpu_virtualization { "vmx/svm present" } else { "not detected" },
                if snapshot.cpu_virtualization {
                    CheckStatus::Pass
                } else {
                    CheckStatus::Warn
                },
            ));
        }

        checks
    }

    async fn network_checks(&self) -> Vec<CheckResult> {
        let mut checks = Vec::new();
        let physical = &self.config.physical_interface;

        checks.push(match self.host.interface_addresses(physical).await {
            Some(_) => CheckResult::new(CheckTier::Network, format!("Interface {}", physical), "present", CheckStatus::Pass),
            None => CheckResult::new(CheckTier::Network, format!("Interface {}", physical), "missing", CheckStatus::Fail),
        });

        for segment in segments_for_role(self.config.role) {
            checks.push(self.segment_check(segment).await);
        }

        checks.push(probe_check(
            CheckTier::Network,
            format!("Gateway {}", self.settings.management_gateway),
            self.host.ping(self.settings.management_gateway).await,
            CheckStatus::Warn,
        ));

        checks.push(probe_check(
            CheckTier::Network,
            format!("Outbound connectivity ({})", self.settings.connectivity_target),
            self.host.ping(self.settings.connectivity_target).await,
            CheckStatus::Warn,
        ));

        if self.config.role.needs_remote_controller() {
            checks.push(probe_check(
                CheckTier::Network,
                format!("Controller {}", self.config.controller_address),
                self.host.ping(self.config.controller_address).await,
                CheckStatus::Fail,
            ));
        }

        checks
    }

    async fn segment_check(&self, segment: NetworkSegment) -> CheckResult {
        let iface = segment.interface_name();
        let name = format!("VLAN {} ({})", iface, segment.vlan_id());
        let expected = self.config.segment_address(segment);

        match (self.host.interface_addresses(iface).await, expected) {
            (None, _) => CheckResult::new(CheckTier::Network, name, "interface missing", CheckStatus::Fail),
            (Some(_), None) => CheckResult::new(CheckTier::Network, name, "present", CheckStatus::Pass),
            (Some(found), Some(expected)) if found.contains(&expected) => {
                CheckResult::new(CheckTier::Network, name, expected.to_string(), CheckStatus::Pass)
            }
            (Some(found), Some(expected)) => {
                let found: Vec<String> = found.iter().map(|a| a.to_string()).collect();
                let found = if found.is_empty() { "none".to_string() } else { found.join(", ") };
                CheckResult::new(
                    CheckTier::Network,
                    name,
                    format!("expected {}, found {}", expected, found),
                    CheckStatus::Fail,
                )
            }
        }
    }

    /// Units expected for the role with the severity of their absence
    fn expected_services(&self) -> Vec<(&'static str, CheckStatus)> {
        let role = self.config.role;
        let mut units = vec![("chrony", CheckStatus::Warn)];
        if role.runs_control_plane() {
            units.push(("ovn-northd", CheckStatus::Fail));
            units.push(("ovn-ovsdb-server-nb", CheckStatus::Fail));
            units.push(("ovn-ovsdb-server-sb", CheckStatus::Fail));
        }
        if role.runs_virtualization() {
            units.push(("openvswitch-switch", CheckStatus::Fail));
            units.push(("ovn-controller", CheckStatus::Fail));
            units.push(("libvirtd", CheckStatus::Fail));
        }
        if role.runs_storage_backend() {
            units.push(("ceph.target", CheckStatus::Fail));
        }
        units
    }

    async fn service_checks(&self) -> Vec<CheckResult> {
        let mut checks = Vec::new();
        for (unit, severity) in self.expected_services() {
            let outcome = self.host.service_active(unit).await;
            debug!("Service {}: {:?}", unit, outcome);
            let mut check = probe_check(CheckTier::Services, unit, outcome, severity);
            if check.status == CheckStatus::Pass {
                check.observed = "active".to_string();
            }
            checks.push(check);
        }
        checks
    }

    async fn functional_checks(&self) -> Vec<CheckResult> {
        let role = self.config.role;
        let timeout = self.settings.probe_timeout().as_secs();
        let mut checks = Vec::new();

        if role.runs_control_plane() {
            checks.push(probe_check(
                CheckTier::Functional,
                "OVN northbound database",
                self.host
                    .command_succeeds(&format!("ovn-nbctl --timeout={} show", timeout))
                    .await,
                CheckStatus::Fail,
            ));
            let url = format!("http://{}:{}/health", self.config.management_address, self.settings.api_port);
            checks.push(probe_check(
                CheckTier::Functional,
                format!("API health ({})", url),
                self.host.http_health(&url).await,
                CheckStatus::Warn,
            ));
        }

        if role.runs_virtualization() {
            checks.push(probe_check(
                CheckTier::Functional,
                "Integration bridge br-int",
                self.host
                    .command_succeeds(&format!("ovs-vsctl --timeout={} br-exists br-int", timeout))
                    .await,
                CheckStatus::Fail,
            ));
            checks.push(probe_check(
                CheckTier::Functional,
                "Hypervisor connection",
                self.host.command_succeeds("virsh -c qemu:///system list").await,
                CheckStatus::Fail,
            ));
        }

        if role.runs_storage_backend() {
            checks.push(probe_check(
                CheckTier::Functional,
                "Ceph cluster health",
                self.host
                    .command_succeeds(&format!("ceph --connect-timeout {} health", timeout))
                    .await,
                CheckStatus::Fail,
            ));
        }

        checks
    }

    async fn journal_check(&self, checks: &mut Vec<CheckResult>) -> Option<JournalSummary> {
        let window = self.settings.journal_window();
        let window_minutes = self.settings.journal_window_minutes;
        let name = format!("Journal errors (last {} min)", window_minutes);

        match self.host.recent_log_counts(window).await {
            Some(counts) => {
                let status = if counts.errors > 0 {
                    CheckStatus::Warn
                } else {
                    CheckStatus::Pass
                };
                checks.push(CheckResult::new(
                    CheckTier::Logs,
                    name,
                    format!("{} errors, {} warnings", counts.errors, counts.warnings),
                    status,
                ));
                Some(JournalSummary {
                    window_minutes,
                    errors: counts.errors,
                    warnings: counts.warnings,
                })
            }
            None => {
                checks.push(CheckResult::new(CheckTier::Logs, name, "journal unavailable", CheckStatus::Warn));
                None
            }
        }
    }
}

/// Map a probe outcome onto a check; a timed-out probe always fails
fn probe_check(tier: CheckTier, name: impl Into<String>, outcome: ProbeOutcome, severity: CheckStatus) -> CheckResult {
    let status = match &outcome {
        ProbeOutcome::Up => CheckStatus::Pass,
        ProbeOutcome::Down(_) => severity,
        ProbeOutcome::TimedOut(_) => CheckStatus::Fail,
    };
    let observed = match &outcome {
        ProbeOutcome::Up => "ok".to_string(),
        other => other.describe(),
    };
    CheckResult::new(tier, name, observed, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_a_failure_even_for_warnings() {
        let check = probe_check(
            CheckTier::Network,
            "Outbound",
            ProbeOutcome::TimedOut(std::time::Duration::from_secs(3)),
            CheckStatus::Warn,
        );

        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.observed.contains("timed out"));
    }

    #[test]
    fn test_down_uses_severity() {
        let check = probe_check(
            CheckTier::Services,
            "chrony",
            ProbeOutcome::Down("inactive".to_string()),
            CheckStatus::Warn,
        );

        assert_eq!(check.status, CheckStatus::Warn);
        assert_eq!(check.observed, "inactive");
    }
}
