// file: src/phases/preflight.rs
// version: 1.0.0
// guid: fcbc52d8-ef2a-4e43-8411-d64d5ae0688f

//! Read-only readiness checks before anything is changed

use super::{ActionOutput, Phase, PhaseCategory, PhaseContext};
use crate::config::NodeRole;
use crate::host::{ProbeOutcome, SystemSnapshot};
use std::net::Ipv4Addr;
use tracing::{info, warn};

/// Ubuntu releases the pipeline is exercised against
const TESTED_RELEASES: &[&str] = &["22.04", "24.04"];

/// One preflight finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub name: &'static str,
    pub message: String,
    pub level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Ok,
    Warning,
    Critical,
}

impl Finding {
    fn line(&self) -> String {
        let mark = match self.level {
            Level::Ok => "✓",
            Level::Warning => "⚠",
            Level::Critical => "✗",
        };
        format!("{} {}: {}", mark, self.name, self.message)
    }
}

/// Evaluate host resources against the role's requirements.
///
/// Only an unsupported operating system is critical; resource shortfalls
/// are warnings.
pub fn evaluate(snapshot: &SystemSnapshot, role: NodeRole) -> Vec<Finding> {
    let mut findings = Vec::new();

    findings.push(match &snapshot.os {
        Some(os) if os.is_supported() && TESTED_RELEASES.contains(&os.version_id.as_str()) => Finding {
            name: "OS",
            message: os.pretty_name.clone(),
            level: Level::Ok,
        },
        Some(os) if os.is_supported() => Finding {
            name: "OS",
            message: format!("{} (untested release)", os.pretty_name),
            level: Level::Warning,
        },
        Some(os) => Finding {
            name: "OS",
            message: format!("{} is not Ubuntu", os.pretty_name),
            level: Level::Critical,
        },
        None => Finding {
            name: "OS",
            message: "cannot determine operating system".to_string(),
            level: Level::Critical,
        },
    });

    findings.push(Finding {
        name: "CPU virtualization",
        message: if snapshot.cpu_virtualization {
            "supported".to_string()
        } else {
            "not detected (KVM may not work)".to_string()
        },
        level: if snapshot.cpu_virtualization || !role.runs_virtualization() {
            Level::Ok
        } else {
            Level::Warning
        },
    });

    let min_memory = role.min_memory_gb() as f64;
    findings.push(Finding {
        name: "Memory",
        message: format!("{:.1}GB (>= {}GB recommended)", snapshot.total_memory_gb, min_memory),
        level: if snapshot.total_memory_gb + 0.5 >= min_memory {
            Level::Ok
        } else {
            Level::Warning
        },
    });

    let min_disk = role.min_disk_gb() as f64;
    findings.push(Finding {
        name: "Disk space",
        message: format!("{:.1}GB free (>= {}GB recommended)", snapshot.root_disk_available_gb, min_disk),
        level: if snapshot.root_disk_available_gb >= min_disk {
            Level::Ok
        } else {
            Level::Warning
        },
    });

    findings
}

/// Reachability of the controller from a node that depends on it.
///
/// Anything but a reply is critical: nothing after preflight can succeed
/// without the control plane. A timeout counts as unreachable.
pub fn controller_finding(controller: Ipv4Addr, outcome: &ProbeOutcome) -> Finding {
    Finding {
        name: "Controller",
        message: if outcome.is_up() {
            format!("{} reachable", controller)
        } else {
            format!("{} unreachable ({})", controller, outcome.describe())
        },
        level: if outcome.is_up() { Level::Ok } else { Level::Critical },
    }
}

/// Preflight phase
pub struct PreflightPhase;

#[async_trait::async_trait]
impl Phase for PreflightPhase {
    fn name(&self) -> &'static str {
        "preflight"
    }

    fn label(&self) -> &'static str {
        "Pre-flight Checks"
    }

    fn category(&self) -> PhaseCategory {
        PhaseCategory::Preflight
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput {
        let snapshot = ctx.host.system_snapshot().await;
        let mut findings = evaluate(&snapshot, ctx.config.role);

        let connectivity = ctx.host.ping(ctx.settings.connectivity_target).await;
        findings.push(Finding {
            name: "Network connectivity",
            message: if connectivity.is_up() {
                "OK".to_string()
            } else {
                format!("no internet access ({})", connectivity.describe())
            },
            level: if connectivity.is_up() { Level::Ok } else { Level::Warning },
        });

        if ctx.config.role.needs_remote_controller() {
            let outcome = ctx.host.ping(ctx.config.controller_address).await;
            findings.push(controller_finding(ctx.config.controller_address, &outcome));
        }

        let mut existing = Vec::new();
        for unit in ["ovn-northd", "libvirtd"] {
            if ctx.host.service_active(unit).await.is_up() {
                existing.push(unit);
            }
        }
        if ctx.host.path_exists(&ctx.settings.post_install_marker()) {
            existing.push("post-install marker");
        }
        findings.push(Finding {
            name: "Existing installation",
            message: if existing.is_empty() {
                "none detected".to_string()
            } else {
                format!("found {} (might be already installed)", existing.join(", "))
            },
            level: if existing.is_empty() { Level::Ok } else { Level::Warning },
        });

        let mut output = String::new();
        for finding in &findings {
            match finding.level {
                Level::Ok => info!("{}", finding.line()),
                _ => warn!("{}", finding.line()),
            }
            output.push_str(&finding.line());
            output.push('\n');
        }

        if findings.iter().any(|f| f.level == Level::Critical) {
            output.push_str("Critical check failed\n");
            ActionOutput::failure(output)
        } else {
            ActionOutput::success(output)
        }
    }

    async fn is_satisfied(&self, ctx: &PhaseContext<'_>) -> bool {
        let snapshot = ctx.host.system_snapshot().await;
        evaluate(&snapshot, ctx.config.role)
            .iter()
            .all(|f| f.level != Level::Critical)
    }
}
