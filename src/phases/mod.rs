// file: src/phases/mod.rs
// version: 1.0.0
// guid: 94a28759-3a39-40f6-93d2-04f94c4cf0de

//! Provisioning phases
//!
//! A phase is one ordered unit of work with an action and an independent
//! post-condition probe. The orchestrator only ever sees the [`Phase`] trait;
//! what the action does to the host is opaque to it.

pub mod control_plane;
pub mod network;
pub mod post_install;
pub mod preflight;
pub mod registry;
pub mod script;
pub mod storage_backend;
pub mod system_prep;
pub mod verification;
pub mod virtualization;

pub use registry::{PhaseRegistry, RegisteredPhase};

use crate::config::{InstallerSettings, NodeConfig, NodeRole};
use crate::host::{CommandRunner, HostProbe};
use uuid::Uuid;

/// Pipeline stage a phase belongs to; decides role applicability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseCategory {
    Preflight,
    SystemPrep,
    Network,
    ControlPlane,
    Virtualization,
    StorageBackend,
    PostInstall,
    Verification,
}

impl PhaseCategory {
    /// Roles for which phases of this category run
    pub fn roles(&self) -> &'static [NodeRole] {
        match self {
            PhaseCategory::ControlPlane => &[NodeRole::Controller, NodeRole::Combined],
            PhaseCategory::Virtualization => &[NodeRole::Compute, NodeRole::Combined],
            PhaseCategory::StorageBackend => &[NodeRole::Storage],
            _ => &NodeRole::ALL,
        }
    }

    /// Phases re-run by a network+services reconfigure
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            PhaseCategory::ControlPlane | PhaseCategory::Virtualization | PhaseCategory::StorageBackend
        )
    }
}

/// Everything a phase may look at or act through
#[derive(Clone, Copy)]
pub struct PhaseContext<'a> {
    /// Current installation session ID
    pub session_id: Uuid,

    /// Validated node configuration
    pub config: &'a NodeConfig,

    pub settings: &'a InstallerSettings,

    /// Executes the phase's side effects
    pub runner: &'a dyn CommandRunner,

    /// Read-only view used by probes
    pub host: &'a dyn HostProbe,

    /// Current step number (1-based)
    pub step_number: usize,

    /// Total number of steps in this run
    pub total_steps: usize,
}

/// What a phase action reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    pub success: bool,
    /// Combined output captured while the action ran
    pub output: String,
}

impl ActionOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }

    /// Fold an internal `anyhow` result into an action outcome, keeping the
    /// transcript gathered so far
    pub fn from_result(transcript: String, result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Self::success(transcript),
            Err(e) => {
                let mut output = transcript;
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
                output.push_str(&format!("ERROR: {:#}\n", e));
                Self::failure(output)
            }
        }
    }
}

/// Trait for provisioning phases
#[async_trait::async_trait]
pub trait Phase: Send + Sync {
    /// Unique machine name, also the phase log file stem
    fn name(&self) -> &'static str;

    /// Human-readable label
    fn label(&self) -> &'static str;

    fn category(&self) -> PhaseCategory;

    /// Roles this phase applies to
    fn roles(&self) -> &'static [NodeRole] {
        self.category().roles()
    }

    fn applies_to(&self, role: NodeRole) -> bool {
        self.roles().contains(&role)
    }

    /// Run the side-effecting action
    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput;

    /// Post-condition probe: true if the phase's effect is already present
    async fn is_satisfied(&self, ctx: &PhaseContext<'_>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roles() {
        assert_eq!(PhaseCategory::Network.roles(), &NodeRole::ALL);
        assert!(!PhaseCategory::ControlPlane.roles().contains(&NodeRole::Compute));
        assert!(PhaseCategory::Virtualization.roles().contains(&NodeRole::Combined));
        assert_eq!(PhaseCategory::StorageBackend.roles(), &[NodeRole::Storage]);
    }

    #[test]
    fn test_failed_result_keeps_transcript() {
        let output = ActionOutput::from_result(
            "==> step one\n".to_string(),
            Err(anyhow::anyhow!("boom").context("step two failed")),
        );

        assert!(!output.success);
        assert!(output.output.starts_with("==> step one\n"));
        assert!(output.output.contains("ERROR: step two failed: boom"));
    }
}
