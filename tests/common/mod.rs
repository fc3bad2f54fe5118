// file: tests/common/mod.rs
// version: 1.0.0
// guid: f597b13a-dfc5-4d25-a9b9-5fd74fb1b379

//! Shared fakes for integration tests: a scripted host and in-memory phases

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Local;
use cloud_node_installer::config::{segments_for_role, InstallerSettings, NodeConfig, NodeRole};
use cloud_node_installer::host::{DryRunRunner, HostProbe, LogCounts, ProbeOutcome, SystemSnapshot};
use cloud_node_installer::installer::Installer;
use cloud_node_installer::logging::LogLayout;
use cloud_node_installer::phases::{ActionOutput, Phase, PhaseCategory, PhaseContext, PhaseRegistry};
use cloud_node_installer::utils::system::OsRelease;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Host whose every probe answers from tables set up by the test
#[derive(Default)]
pub struct FakeHost {
    interfaces: HashMap<String, Vec<Ipv4Addr>>,
    down_units: HashSet<String>,
    unreachable: HashSet<Ipv4Addr>,
    failing_commands: Vec<String>,
    journal_errors: u64,
}

impl FakeHost {
    /// A host on which `config` is fully applied
    pub fn healthy_for(config: &NodeConfig) -> Self {
        let mut host = FakeHost::default();
        host.interfaces.insert(config.physical_interface.clone(), Vec::new());
        for segment in segments_for_role(config.role) {
            let addresses = config.segment_address(segment).into_iter().collect();
            host.interfaces.insert(segment.interface_name().to_string(), addresses);
        }
        host
    }

    pub fn with_unit_down(mut self, unit: &str) -> Self {
        self.down_units.insert(unit.to_string());
        self
    }

    pub fn with_unreachable(mut self, address: Ipv4Addr) -> Self {
        self.unreachable.insert(address);
        self
    }

    pub fn without_interface(mut self, name: &str) -> Self {
        self.interfaces.remove(name);
        self
    }

    /// Shell checks containing `fragment` fail
    pub fn with_failing_command(mut self, fragment: &str) -> Self {
        self.failing_commands.push(fragment.to_string());
        self
    }

    pub fn with_journal_errors(mut self, errors: u64) -> Self {
        self.journal_errors = errors;
        self
    }
}

#[async_trait]
impl HostProbe for FakeHost {
    async fn interface_addresses(&self, name: &str) -> Option<Vec<Ipv4Addr>> {
        self.interfaces.get(name).cloned()
    }

    async fn service_active(&self, unit: &str) -> ProbeOutcome {
        if self.down_units.contains(unit) {
            ProbeOutcome::Down("inactive".to_string())
        } else {
            ProbeOutcome::Up
        }
    }

    async fn ping(&self, address: Ipv4Addr) -> ProbeOutcome {
        if self.unreachable.contains(&address) {
            ProbeOutcome::TimedOut(Duration::from_secs(3))
        } else {
            ProbeOutcome::Up
        }
    }

    async fn http_health(&self, _url: &str) -> ProbeOutcome {
        ProbeOutcome::Up
    }

    async fn command_succeeds(&self, command: &str) -> ProbeOutcome {
        if self.failing_commands.iter().any(|f| command.contains(f.as_str())) {
            ProbeOutcome::Down("exit code 1".to_string())
        } else {
            ProbeOutcome::Up
        }
    }

    async fn system_snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            kernel: "6.8.0-45-generic".to_string(),
            total_memory_gb: 64.0,
            root_disk_total_gb: 500.0,
            root_disk_available_gb: 400.0,
            cpu_virtualization: true,
            os: Some(OsRelease::parse("ID=ubuntu\nVERSION_ID=\"24.04\"\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\n")),
        }
    }

    async fn recent_log_counts(&self, _window: Duration) -> Option<LogCounts> {
        Some(LogCounts {
            errors: self.journal_errors,
            warnings: 0,
        })
    }
}

/// Shared state of the in-memory phases: what ran and what is applied
#[derive(Default)]
pub struct FakeWorld {
    applied: Mutex<HashSet<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
    runs: Mutex<Vec<&'static str>>,
}

impl FakeWorld {
    pub fn fail(&self, phase: &'static str) {
        self.failing.lock().unwrap().insert(phase);
    }

    pub fn heal(&self, phase: &'static str) {
        self.failing.lock().unwrap().remove(phase);
    }

    /// Simulate drift: the phase's effect disappears from the host
    pub fn revert(&self, phase: &'static str) {
        self.applied.lock().unwrap().remove(phase);
    }

    pub fn runs(&self) -> Vec<&'static str> {
        self.runs.lock().unwrap().clone()
    }

    pub fn reset_runs(&self) {
        self.runs.lock().unwrap().clear();
    }
}

pub struct FakePhase {
    name: &'static str,
    category: PhaseCategory,
    world: Arc<FakeWorld>,
}

#[async_trait]
impl Phase for FakePhase {
    fn name(&self) -> &'static str {
        self.name
    }

    fn label(&self) -> &'static str {
        self.name
    }

    fn category(&self) -> PhaseCategory {
        self.category
    }

    async fn run(&self, _ctx: &PhaseContext<'_>) -> ActionOutput {
        self.world.runs.lock().unwrap().push(self.name);
        if self.world.failing.lock().unwrap().contains(self.name) {
            return ActionOutput::failure(format!("{}: simulated failure", self.name));
        }
        self.world.applied.lock().unwrap().insert(self.name);
        ActionOutput::success(format!("{}: applied", self.name))
    }

    async fn is_satisfied(&self, _ctx: &PhaseContext<'_>) -> bool {
        self.world.applied.lock().unwrap().contains(self.name)
    }
}

/// The standard pipeline shape backed by [`FakePhase`]s
pub fn fake_registry(world: &Arc<FakeWorld>) -> PhaseRegistry {
    let phases: [(&'static str, PhaseCategory); 8] = [
        ("preflight", PhaseCategory::Preflight),
        ("system_prep", PhaseCategory::SystemPrep),
        ("network", PhaseCategory::Network),
        ("control_plane", PhaseCategory::ControlPlane),
        ("virtualization", PhaseCategory::Virtualization),
        ("storage_backend", PhaseCategory::StorageBackend),
        ("post_install", PhaseCategory::PostInstall),
        ("verification", PhaseCategory::Verification),
    ];
    PhaseRegistry::new(
        phases
            .into_iter()
            .map(|(name, category)| {
                Arc::new(FakePhase {
                    name,
                    category,
                    world: Arc::clone(world),
                }) as Arc<dyn Phase>
            })
            .collect(),
    )
}

pub fn compute_config() -> NodeConfig {
    NodeConfig::builder()
        .role(NodeRole::Compute)
        .hostname("compute-01")
        .management_address("10.0.0.11")
        .controller_address("10.0.0.10")
        .physical_interface("eth0")
        .build()
        .unwrap()
}

pub fn controller_config() -> NodeConfig {
    NodeConfig::builder()
        .role(NodeRole::Controller)
        .hostname("controller-01")
        .management_address("10.0.0.10")
        .physical_interface("eth0")
        .build()
        .unwrap()
}

/// Installer over a scratch directory, fake phases and a healthy fake host
pub struct Harness {
    pub dir: TempDir,
    pub settings: InstallerSettings,
    pub layout: LogLayout,
    pub world: Arc<FakeWorld>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let settings = InstallerSettings::rooted_at(dir.path());
        let layout = LogLayout::new(&settings.log_dir, Local::now());
        layout.ensure().unwrap();
        Self {
            dir,
            settings,
            layout,
            world: Arc::new(FakeWorld::default()),
        }
    }

    pub fn installer(&self, host: FakeHost) -> Installer {
        Installer::new(
            self.settings.clone(),
            self.layout.clone(),
            Arc::new(DryRunRunner::new()),
            Arc::new(host),
        )
        .with_registry(fake_registry(&self.world))
    }

    /// Installer over the real phase pipeline; actions are only recorded
    pub fn standard_installer(&self, host: FakeHost) -> Installer {
        Installer::new(
            self.settings.clone(),
            self.layout.clone(),
            Arc::new(DryRunRunner::new()),
            Arc::new(host),
        )
    }

    /// Leave the completion marker the post-install phase writes
    pub fn mark_post_install_done(&self) {
        let marker = self.settings.post_install_marker();
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(marker, "role=compute\n").unwrap();
    }
}
