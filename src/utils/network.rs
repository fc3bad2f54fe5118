// file: src/utils/network.rs
// version: 2.0.0
// guid: 8f206964-bef7-4e5d-ac7f-368c37a2ed53

//! Physical interface detection

use crate::{InstallerError, Result};
use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use std::fs;
use tracing::{debug, warn};

/// Kernel routing table consulted for the default route
pub const ROUTE_TABLE_PATH: &str = "/proc/net/route";

/// Interface name prefixes that never carry the node's physical traffic
const VIRTUAL_PREFIXES: &[&str] = &["lo", "docker", "veth", "virbr", "br-", "tap", "vnet", "ovs-", "genev"];

/// Network utilities for the installer
pub struct NetworkUtils;

impl NetworkUtils {
    /// Detect the physical interface: the default-route interface, falling
    /// back to the first non-loopback, non-virtual interface
    pub fn detect_interface() -> Result<String> {
        let route_table = fs::read_to_string(ROUTE_TABLE_PATH).unwrap_or_else(|e| {
            warn!("Could not read {}: {}", ROUTE_TABLE_PATH, e);
            String::new()
        });

        if let Some(name) = default_route_interface(&route_table) {
            debug!("Default route goes through {}", name);
            return Ok(name);
        }

        let names: Vec<String> = NetworkInterface::show()
            .map_err(|e| InstallerError::interface_detection(format!("Failed to list interfaces: {}", e)))?
            .into_iter()
            .map(|iface| iface.name)
            .collect();

        first_candidate_interface(&names).ok_or_else(|| {
            InstallerError::interface_detection("No default route and no non-loopback interface found")
        })
    }
}

/// Interface owning the `0.0.0.0` destination in a `/proc/net/route` dump
pub fn default_route_interface(route_table: &str) -> Option<String> {
    route_table
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|fields| fields.len() > 2 && fields[1] == "00000000")
        .map(|fields| fields[0].to_string())
}

/// First interface name that is not loopback or a known virtual device
pub fn first_candidate_interface(names: &[String]) -> Option<String> {
    names
        .iter()
        .find(|name| !VIRTUAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix)))
        .cloned()
}
