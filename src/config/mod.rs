// file: src/config/mod.rs
// version: 2.0.0
// guid: c4095b39-39bc-455f-b2fd-c3ff46ae85b9

//! Configuration module for the cloud node installer
//!
//! Holds the node-role model that parameterizes every phase, the installer's
//! own settings, and the durable store the node configuration lives in.

pub mod address;
pub mod collector;
pub mod loader;
pub mod node;
pub mod settings;
pub mod store;

pub use address::{segments_for_role, Ipv4Cidr, NetworkSegment};
pub use collector::{collect_interactive, Prompter};
pub use loader::ConfigLoader;
pub use node::{AddressOverrides, NodeConfig, NodeConfigBuilder, PublicNetwork, StorageSettings};
pub use settings::InstallerSettings;
pub use store::ConfigStore;

use serde::{Deserialize, Serialize};

/// Functional role assigned to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Controller,
    Compute,
    Storage,
    Combined,
}

impl NodeRole {
    /// All roles in menu order
    pub const ALL: [NodeRole; 4] = [
        NodeRole::Controller,
        NodeRole::Compute,
        NodeRole::Storage,
        NodeRole::Combined,
    ];

    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Controller => "controller",
            NodeRole::Compute => "compute",
            NodeRole::Storage => "storage",
            NodeRole::Combined => "combined",
        }
    }

    /// Short description shown in the role menu
    pub fn description(&self) -> &'static str {
        match self {
            NodeRole::Controller => "Controller (OVN Central, API, Monitoring)",
            NodeRole::Compute => "Compute (KVM, OVN Host, VM Hosting)",
            NodeRole::Storage => "Storage (Ceph, Object/Block Storage)",
            NodeRole::Combined => "Combined (Controller + Compute)",
        }
    }

    /// Controller and combined nodes run the control plane and are their own controller
    pub fn runs_control_plane(&self) -> bool {
        matches!(self, NodeRole::Controller | NodeRole::Combined)
    }

    /// Compute and combined nodes host the virtualization overlay
    pub fn runs_virtualization(&self) -> bool {
        matches!(self, NodeRole::Compute | NodeRole::Combined)
    }

    /// Storage nodes run the storage backend
    pub fn runs_storage_backend(&self) -> bool {
        matches!(self, NodeRole::Storage)
    }

    /// Compute and storage nodes need a separately supplied controller address
    pub fn needs_remote_controller(&self) -> bool {
        matches!(self, NodeRole::Compute | NodeRole::Storage)
    }

    /// Roles that carry public networking fields
    pub fn has_public_network(&self) -> bool {
        self.runs_control_plane()
    }

    /// Roles that carry storage networking fields
    pub fn has_storage_settings(&self) -> bool {
        matches!(self, NodeRole::Storage | NodeRole::Combined)
    }

    /// Recommended memory in GB
    pub fn min_memory_gb(&self) -> u64 {
        match self {
            NodeRole::Controller => 4,
            NodeRole::Compute => 8,
            NodeRole::Storage => 8,
            NodeRole::Combined => 12,
        }
    }

    /// Recommended free disk on `/` in GB
    pub fn min_disk_gb(&self) -> u64 {
        match self {
            NodeRole::Controller => 20,
            NodeRole::Compute => 50,
            NodeRole::Storage => 100,
            NodeRole::Combined => 70,
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeRole {
    type Err = crate::error::InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "controller" | "1" => Ok(NodeRole::Controller),
            "compute" | "2" => Ok(NodeRole::Compute),
            "storage" | "3" => Ok(NodeRole::Storage),
            "combined" | "4" => Ok(NodeRole::Combined),
            _ => Err(crate::error::InstallerError::Validation(format!(
                "Unknown node role: {} (expected controller, compute, storage or combined)",
                s
            ))),
        }
    }
}
