// file: src/config/node.rs
// version: 1.0.0
// guid: c0ef384f-8db1-4cae-9ede-1b9354da3cb9

//! Node configuration record and its builder

use super::address::{Ipv4Cidr, NetworkSegment};
use super::NodeRole;
use crate::utils::validation::{self, derive_address, INTERNAL_OCTET, STORAGE_OCTET};
use crate::{InstallerError, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Default public block offered to controller nodes
pub const DEFAULT_PUBLIC_BLOCK: &str = "203.0.113.0/24";
/// Default public gateway offered to controller nodes
pub const DEFAULT_PUBLIC_GATEWAY: &str = "203.0.113.254";
/// Default storage cluster and public network
pub const DEFAULT_STORAGE_NETWORK: &str = "10.0.2.0/24";

/// Validated configuration of the node being provisioned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Functional role, fixed once installation begins
    pub role: NodeRole,
    /// Node hostname
    pub hostname: String,
    /// Address used for SSH/admin access, base for derived addresses
    pub management_address: Ipv4Addr,
    /// Tenant overlay (internal VLAN) address
    pub internal_address: Ipv4Addr,
    /// Storage VLAN address
    pub storage_address: Ipv4Addr,
    /// Controller node address; equals management address on controller roles
    pub controller_address: Ipv4Addr,
    /// Interface carrying every VLAN
    pub physical_interface: String,
    /// Public networking, controller and combined roles only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_network: Option<PublicNetwork>,
    /// Storage networking, storage and combined roles only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSettings>,
    /// Which derived addresses were set explicitly
    #[serde(default)]
    pub overrides: AddressOverrides,
}

/// Public IP block handed out to tenants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicNetwork {
    pub ip_block: Ipv4Cidr,
    pub gateway: Ipv4Addr,
}

/// Storage backend networking and disks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    pub cluster_network: Ipv4Cidr,
    pub public_network: Ipv4Cidr,
    #[serde(default)]
    pub disks: Vec<String>,
}

/// Flags recording explicit overrides of derived addresses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOverrides {
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub storage: bool,
}

impl NodeConfig {
    /// Start a builder for the given role and management address
    pub fn builder() -> NodeConfigBuilder {
        NodeConfigBuilder::default()
    }

    /// Address assigned to a segment on this node, if the segment carries one
    pub fn segment_address(&self, segment: NetworkSegment) -> Option<Ipv4Addr> {
        match segment {
            NetworkSegment::Management => Some(self.management_address),
            NetworkSegment::Internal => Some(self.internal_address),
            NetworkSegment::Storage => Some(self.storage_address),
            NetworkSegment::External => None,
        }
    }

    /// True once every field the role requires is present and valid
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validate the configuration field by field
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(InstallerError::validation("Hostname cannot be empty"));
        }
        if !validation::validate_hostname(&self.hostname) {
            return Err(InstallerError::validation(format!("Invalid hostname: '{}'", self.hostname)));
        }

        if !validation::validate_interface_name(&self.physical_interface) {
            return Err(InstallerError::validation(format!(
                "Invalid physical interface name: '{}'",
                self.physical_interface
            )));
        }

        let host = self.management_address.octets()[3];
        if !self.overrides.internal && self.internal_address != derive_address(self.management_address, INTERNAL_OCTET) {
            return Err(InstallerError::validation(format!(
                "Internal address {} does not match management host .{} and is not marked as an override",
                self.internal_address, host
            )));
        }
        if !self.overrides.storage && self.storage_address != derive_address(self.management_address, STORAGE_OCTET) {
            return Err(InstallerError::validation(format!(
                "Storage address {} does not match management host .{} and is not marked as an override",
                self.storage_address, host
            )));
        }

        if self.role.runs_control_plane() {
            if self.controller_address != self.management_address {
                return Err(InstallerError::validation(format!(
                    "Controller address must equal the management address on a {} node",
                    self.role
                )));
            }
        } else if self.controller_address == self.management_address {
            return Err(InstallerError::validation(format!(
                "A {} node needs the address of a separate controller node",
                self.role
            )));
        }

        match (&self.public_network, self.role.has_public_network()) {
            (None, true) => {
                return Err(InstallerError::validation(format!(
                    "A {} node requires a public IP block and gateway",
                    self.role
                )))
            }
            (Some(public), true) => {
                if !public.ip_block.contains(public.gateway) {
                    return Err(InstallerError::validation(format!(
                        "Public gateway {} is outside the public block {}",
                        public.gateway, public.ip_block
                    )));
                }
            }
            _ => {}
        }

        if self.role.has_storage_settings() {
            let storage = self.storage.as_ref().ok_or_else(|| {
                InstallerError::validation(format!(
                    "A {} node requires storage network settings",
                    self.role
                ))
            })?;
            if self.role == NodeRole::Storage && storage.disks.is_empty() {
                return Err(InstallerError::validation(
                    "A storage node requires at least one data disk",
                ));
            }
            if let Some(bad) = storage.disks.iter().find(|d| !validation::validate_disk_name(d)) {
                return Err(InstallerError::validation(format!("Invalid disk name: '{}'", bad)));
            }
        }

        Ok(())
    }

    /// Label/value pairs for the configuration summary
    pub fn summary_lines(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Node Type", self.role.to_string()),
            ("Hostname", self.hostname.clone()),
            ("Management IP", self.management_address.to_string()),
            ("Internal IP", self.internal_address.to_string()),
            ("Storage IP", self.storage_address.to_string()),
            ("Physical Intf", self.physical_interface.clone()),
        ];

        if self.role.needs_remote_controller() {
            lines.push(("Controller IP", self.controller_address.to_string()));
        }

        if let Some(public) = &self.public_network {
            lines.push(("Public IP Block", public.ip_block.to_string()));
            lines.push(("Public Gateway", public.gateway.to_string()));
        }

        if let Some(storage) = &self.storage {
            lines.push(("Ceph Network", storage.cluster_network.to_string()));
            lines.push(("Ceph Public Net", storage.public_network.to_string()));
            lines.push(("Ceph Disks", storage.disks.join(", ")));
        }

        lines
    }

    /// Render the summary as aligned text
    pub fn render_summary(&self) -> String {
        self.summary_lines()
            .into_iter()
            .map(|(label, value)| format!("  {:<17} {}\n", format!("{}:", label), value))
            .collect()
    }
}

/// Unvalidated node configuration input.
///
/// This is also the on-disk format accepted by `--config FILE`: every field is
/// optional and values are kept as strings until `build` validates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfigBuilder {
    #[serde(default)]
    pub role: Option<NodeRole>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub management_address: Option<String>,
    #[serde(default)]
    pub internal_address: Option<String>,
    #[serde(default)]
    pub storage_address: Option<String>,
    #[serde(default)]
    pub controller_address: Option<String>,
    #[serde(default)]
    pub physical_interface: Option<String>,
    #[serde(default)]
    pub public_ip_block: Option<String>,
    #[serde(default)]
    pub public_gateway: Option<String>,
    #[serde(default)]
    pub storage_cluster_network: Option<String>,
    #[serde(default)]
    pub storage_public_network: Option<String>,
    #[serde(default)]
    pub storage_disks: Option<Vec<String>>,
}

impl NodeConfigBuilder {
    pub fn role(mut self, role: NodeRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn management_address(mut self, address: impl Into<String>) -> Self {
        self.management_address = Some(address.into());
        self
    }

    pub fn internal_address(mut self, address: impl Into<String>) -> Self {
        self.internal_address = Some(address.into());
        self
    }

    pub fn storage_address(mut self, address: impl Into<String>) -> Self {
        self.storage_address = Some(address.into());
        self
    }

    pub fn controller_address(mut self, address: impl Into<String>) -> Self {
        self.controller_address = Some(address.into());
        self
    }

    pub fn physical_interface(mut self, interface: impl Into<String>) -> Self {
        self.physical_interface = Some(interface.into());
        self
    }

    pub fn public_network(mut self, block: impl Into<String>, gateway: impl Into<String>) -> Self {
        self.public_ip_block = Some(block.into());
        self.public_gateway = Some(gateway.into());
        self
    }

    pub fn storage_networks(mut self, cluster: impl Into<String>, public: impl Into<String>) -> Self {
        self.storage_cluster_network = Some(cluster.into());
        self.storage_public_network = Some(public.into());
        self
    }

    pub fn storage_disks(mut self, disks: Vec<String>) -> Self {
        self.storage_disks = Some(disks);
        self
    }

    /// Overlay every field set in `other` on top of this builder.
    ///
    /// When `other` switches to a role that is its own controller, a
    /// controller address it does not set itself is dropped.
    pub fn merge(mut self, other: NodeConfigBuilder) -> Self {
        let becomes_controller = other.role.is_some_and(|role| role.runs_control_plane())
            && other.role != self.role
            && other.controller_address.is_none();
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            role,
            hostname,
            management_address,
            internal_address,
            storage_address,
            controller_address,
            physical_interface,
            public_ip_block,
            public_gateway,
            storage_cluster_network,
            storage_public_network,
            storage_disks
        );
        if becomes_controller {
            self.controller_address = None;
        }
        self
    }

    /// Validate the input and derive the remaining addresses
    pub fn build(self) -> Result<NodeConfig> {
        let role = self
            .role
            .ok_or_else(|| InstallerError::validation("Node role is required"))?;

        let management_text = non_empty(self.management_address)
            .ok_or_else(|| InstallerError::validation("Management address is required"))?;
        let management_address = validation::parse_ipv4("Management address", &management_text)?;

        let mut overrides = AddressOverrides::default();
        let internal_address = match non_empty(self.internal_address) {
            Some(text) => {
                let addr = validation::parse_ipv4("Internal address", &text)?;
                overrides.internal = addr != derive_address(management_address, INTERNAL_OCTET);
                addr
            }
            None => derive_address(management_address, INTERNAL_OCTET),
        };
        let storage_address = match non_empty(self.storage_address) {
            Some(text) => {
                let addr = validation::parse_ipv4("Storage address", &text)?;
                overrides.storage = addr != derive_address(management_address, STORAGE_OCTET);
                addr
            }
            None => derive_address(management_address, STORAGE_OCTET),
        };

        let controller_address = if role.runs_control_plane() {
            if let Some(text) = non_empty(self.controller_address) {
                let supplied = validation::parse_ipv4("Controller address", &text)?;
                if supplied != management_address {
                    return Err(InstallerError::validation(format!(
                        "A {} node is its own controller; controller address {} differs from management address {}",
                        role, supplied, management_address
                    )));
                }
            }
            management_address
        } else {
            let text = non_empty(self.controller_address).ok_or_else(|| {
                InstallerError::validation(format!("A {} node requires the controller address", role))
            })?;
            validation::parse_ipv4("Controller address", &text)?
        };

        let physical_interface = non_empty(self.physical_interface)
            .ok_or_else(|| InstallerError::validation("Physical interface is required"))?;

        let public_network = if role.has_public_network() {
            let block = non_empty(self.public_ip_block).unwrap_or_else(|| DEFAULT_PUBLIC_BLOCK.to_string());
            let gateway = non_empty(self.public_gateway).unwrap_or_else(|| DEFAULT_PUBLIC_GATEWAY.to_string());
            Some(PublicNetwork {
                ip_block: block.parse()?,
                gateway: validation::parse_ipv4("Public gateway", &gateway)?,
            })
        } else {
            None
        };

        let storage = if role.has_storage_settings() {
            let cluster = non_empty(self.storage_cluster_network)
                .unwrap_or_else(|| DEFAULT_STORAGE_NETWORK.to_string());
            let public = non_empty(self.storage_public_network)
                .unwrap_or_else(|| DEFAULT_STORAGE_NETWORK.to_string());
            let disks = self
                .storage_disks
                .unwrap_or_default()
                .into_iter()
                .map(|d| d.trim().trim_start_matches("/dev/").to_string())
                .filter(|d| !d.is_empty())
                .collect();
            Some(StorageSettings {
                cluster_network: cluster.parse()?,
                public_network: public.parse()?,
                disks,
            })
        } else {
            None
        };

        let hostname = non_empty(self.hostname).unwrap_or_else(crate::utils::system::SystemUtils::hostname);

        let config = NodeConfig {
            role,
            hostname,
            management_address,
            internal_address,
            storage_address,
            controller_address,
            physical_interface: physical_interface.trim().to_string(),
            public_network,
            storage,
            overrides,
        };

        config.validate()?;
        Ok(config)
    }
}

impl From<&NodeConfig> for NodeConfigBuilder {
    /// Seed a builder from a saved configuration; derived addresses are left
    /// unset so they follow a changed management address.
    fn from(config: &NodeConfig) -> Self {
        NodeConfigBuilder {
            role: Some(config.role),
            hostname: Some(config.hostname.clone()),
            management_address: Some(config.management_address.to_string()),
            internal_address: config
                .overrides
                .internal
                .then(|| config.internal_address.to_string()),
            storage_address: config
                .overrides
                .storage
                .then(|| config.storage_address.to_string()),
            controller_address: config
                .role
                .needs_remote_controller()
                .then(|| config.controller_address.to_string()),
            physical_interface: Some(config.physical_interface.clone()),
            public_ip_block: config.public_network.as_ref().map(|p| p.ip_block.to_string()),
            public_gateway: config.public_network.as_ref().map(|p| p.gateway.to_string()),
            storage_cluster_network: config.storage.as_ref().map(|s| s.cluster_network.to_string()),
            storage_public_network: config.storage.as_ref().map(|s| s.public_network.to_string()),
            storage_disks: config.storage.as_ref().map(|s| s.disks.clone()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
