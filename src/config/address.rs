// file: src/config/address.rs
// version: 1.0.0
// guid: ceff441e-3a81-4683-85ed-a401c7e1cd95

//! CIDR blocks and the VLAN segment plan

use super::NodeRole;
use crate::utils::validation::{self, INTERNAL_OCTET, MANAGEMENT_OCTET, STORAGE_OCTET};
use crate::InstallerError;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// An IPv4 network in `a.b.c.d/len` notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    pub address: Ipv4Addr,
    pub prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(address: Ipv4Addr, prefix: u8) -> crate::Result<Self> {
        if prefix > 32 {
            return Err(InstallerError::validation(format!(
                "Prefix length {} is out of range",
                prefix
            )));
        }
        Ok(Self { address, prefix })
    }

    /// Whether `addr` falls inside this network
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        };
        (u32::from(self.address) & mask) == (u32::from(addr) & mask)
    }
}

impl std::fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

impl std::str::FromStr for Ipv4Cidr {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !validation::validate_cidr(trimmed) {
            return Err(InstallerError::validation(format!(
                "'{}' is not a valid CIDR block",
                s
            )));
        }
        let (address, prefix) = trimmed
            .split_once('/')
            .ok_or_else(|| InstallerError::validation(format!("'{}' has no prefix", s)))?;
        let address = validation::parse_ipv4("CIDR address", address)?;
        let prefix = prefix
            .parse::<u8>()
            .map_err(|e| InstallerError::validation(format!("'{}': {}", s, e)))?;
        Ipv4Cidr::new(address, prefix)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = InstallerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.to_string()
    }
}

/// VLAN segments carried over the physical interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkSegment {
    Management,
    External,
    Internal,
    Storage,
}

impl NetworkSegment {
    /// Interface name created for this segment
    pub fn interface_name(&self) -> &'static str {
        match self {
            NetworkSegment::Management => "mgmt",
            NetworkSegment::External => "external",
            NetworkSegment::Internal => "internal",
            NetworkSegment::Storage => "storage",
        }
    }

    pub fn vlan_id(&self) -> u16 {
        match self {
            NetworkSegment::Management => 4003,
            NetworkSegment::External => 4000,
            NetworkSegment::Internal => 4001,
            NetworkSegment::Storage => 4002,
        }
    }

    pub fn mtu(&self) -> u16 {
        match self {
            NetworkSegment::Management | NetworkSegment::External => 1500,
            NetworkSegment::Internal | NetworkSegment::Storage => 9000,
        }
    }

    /// Third octet of the segment's `10.0.x.0/24` network; external carries no address
    pub fn third_octet(&self) -> Option<u8> {
        match self {
            NetworkSegment::Management => Some(MANAGEMENT_OCTET),
            NetworkSegment::Internal => Some(INTERNAL_OCTET),
            NetworkSegment::Storage => Some(STORAGE_OCTET),
            NetworkSegment::External => None,
        }
    }

    /// Prefix length used when assigning the segment address
    pub fn prefix_len(&self) -> u8 {
        24
    }
}

impl std::fmt::Display for NetworkSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.interface_name())
    }
}

/// Segments instantiated on a node of the given role, in bring-up order
pub fn segments_for_role(role: NodeRole) -> Vec<NetworkSegment> {
    match role {
        NodeRole::Controller => vec![NetworkSegment::Management],
        NodeRole::Compute => vec![
            NetworkSegment::Management,
            NetworkSegment::Internal,
            NetworkSegment::Storage,
        ],
        NodeRole::Storage => vec![NetworkSegment::Management, NetworkSegment::Storage],
        NodeRole::Combined => vec![
            NetworkSegment::Management,
            NetworkSegment::External,
            NetworkSegment::Internal,
            NetworkSegment::Storage,
        ],
    }
}
