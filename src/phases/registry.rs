// file: src/phases/registry.rs
// version: 1.0.0
// guid: 670a8e1b-6e9c-4a12-b9db-5518a186c2b6

//! Ordered phase registry and role filtering

use super::control_plane::ControlPlanePhase;
use super::network::NetworkPhase;
use super::post_install::PostInstallPhase;
use super::preflight::PreflightPhase;
use super::storage_backend::StorageBackendPhase;
use super::system_prep::SystemPrepPhase;
use super::verification::VerificationPhase;
use super::virtualization::VirtualizationPhase;
use super::Phase;
use crate::config::NodeRole;
use std::sync::Arc;

/// A phase together with its fixed pipeline position
#[derive(Clone)]
pub struct RegisteredPhase {
    /// 1-based position in the full pipeline
    pub ordinal: usize,
    pub phase: Arc<dyn Phase>,
}

impl RegisteredPhase {
    pub fn name(&self) -> &'static str {
        self.phase.name()
    }
}

impl std::fmt::Debug for RegisteredPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredPhase")
            .field("ordinal", &self.ordinal)
            .field("name", &self.phase.name())
            .finish()
    }
}

/// Statically ordered list of phases; never mutated after construction
pub struct PhaseRegistry {
    phases: Vec<RegisteredPhase>,
}

impl PhaseRegistry {
    /// Register phases in pipeline order
    pub fn new(phases: Vec<Arc<dyn Phase>>) -> Self {
        Self {
            phases: phases
                .into_iter()
                .enumerate()
                .map(|(i, phase)| RegisteredPhase { ordinal: i + 1, phase })
                .collect(),
        }
    }

    /// The provisioning pipeline
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(PreflightPhase),
            Arc::new(SystemPrepPhase),
            Arc::new(NetworkPhase),
            Arc::new(ControlPlanePhase),
            Arc::new(VirtualizationPhase),
            Arc::new(StorageBackendPhase),
            Arc::new(PostInstallPhase),
            Arc::new(VerificationPhase),
        ])
    }

    pub fn all(&self) -> &[RegisteredPhase] {
        &self.phases
    }

    /// Ordered subsequence applicable to `role`
    pub fn for_role(&self, role: NodeRole) -> Vec<RegisteredPhase> {
        self.phases
            .iter()
            .filter(|p| p.phase.applies_to(role))
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredPhase> {
        self.phases.iter().find(|p| p.phase.name() == name)
    }
}

impl Default for PhaseRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::PhaseCategory;

    fn names(role: NodeRole) -> Vec<&'static str> {
        PhaseRegistry::standard()
            .for_role(role)
            .iter()
            .map(|p| p.name())
            .collect()
    }

    #[test]
    fn test_role_pipelines() {
        assert_eq!(
            names(NodeRole::Controller),
            vec!["preflight", "system_prep", "network", "control_plane", "post_install", "verification"]
        );
        assert_eq!(
            names(NodeRole::Compute),
            vec!["preflight", "system_prep", "network", "virtualization", "post_install", "verification"]
        );
        assert_eq!(
            names(NodeRole::Storage),
            vec!["preflight", "system_prep", "network", "storage_backend", "post_install", "verification"]
        );
        assert_eq!(
            names(NodeRole::Combined),
            vec![
                "preflight",
                "system_prep",
                "network",
                "control_plane",
                "virtualization",
                "post_install",
                "verification"
            ]
        );
    }

    #[test]
    fn test_overlay_never_precedes_network() {
        for role in NodeRole::ALL {
            let phases = PhaseRegistry::standard().for_role(role);
            let network = phases
                .iter()
                .position(|p| p.phase.category() == PhaseCategory::Network)
                .unwrap();
            for (i, p) in phases.iter().enumerate() {
                if p.phase.category().is_service() {
                    assert!(i > network, "{} before network for {}", p.name(), role);
                }
            }
        }
    }

    #[test]
    fn test_ordinals_follow_the_full_pipeline() {
        let compute = PhaseRegistry::standard().for_role(NodeRole::Compute);
        let ordinals: Vec<usize> = compute.iter().map(|p| p.ordinal).collect();

        assert_eq!(ordinals, vec![1, 2, 3, 5, 7, 8]);
        assert!(PhaseRegistry::standard().get("network").is_some());
        assert!(PhaseRegistry::standard().get("nope").is_none());
    }
}
