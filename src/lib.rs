// file: src/lib.rs
// version: 3.0.0
// guid: 0eedfac5-b597-4837-902d-dd510335b454

//! # Cloud Node Installer
//!
//! Provisions a bare Ubuntu host as one node of a small private cloud:
//! a controller running the OVN control plane, a compute node running KVM and
//! the overlay, a Ceph storage node, or a combined controller/compute node.
//!
//! The installer runs an ordered, role-filtered pipeline of phases. Each
//! phase has an action and a post-condition probe, so an interrupted install
//! can be resumed by re-running only what the live host is still missing.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod installer;
pub mod logging;
pub mod phases;
pub mod utils;
pub mod verification;

pub use error::{InstallerError, Result};

/// Version information for the installer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
