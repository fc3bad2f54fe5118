// file: src/cli/args.rs
// version: 2.0.0
// guid: cb2ab652-9ea5-4b6d-a17b-042f5c23774f

//! Command line argument definitions

use crate::config::{ConfigLoader, NodeConfigBuilder, NodeRole};
use crate::installer::ReconfigureScope;
use crate::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cloud-install")]
#[command(about = "Provision private cloud nodes: controller, compute, storage or combined")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Without a subcommand an interactive menu is shown (or, without a
    /// terminal, an unattended fresh install from the saved configuration)
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding node.json, the phase ledger and installer.toml
    #[arg(long, global = true, env = "CLOUD_INSTALL_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Directory for the master log, phase logs and reports
    #[arg(long, global = true, env = "CLOUD_INSTALL_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Installer settings file (TOML)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Record phase commands instead of executing them
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect (or load) a node configuration and run the full pipeline
    Install {
        #[command(flatten)]
        node: NodeArgs,
    },

    /// Resume: re-run every phase whose post-condition no longer holds
    Continue,

    /// Back up the configuration, apply a new one and re-run part of the pipeline
    Reconfigure {
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,

        #[command(flatten)]
        node: NodeArgs,
    },

    /// Run the verification checks only
    Verify,

    /// List the phases a role runs
    Phases {
        #[arg(short, long, value_enum)]
        role: Option<RoleArg>,
    },

    /// Print the saved node configuration
    ShowConfig {
        #[arg(long)]
        json: bool,
    },
}

/// Node configuration supplied on the command line or in a file
#[derive(Args, Debug, Clone, Default)]
pub struct NodeArgs {
    /// Node configuration file (JSON, YAML or TOML) with ${VAR} expansion
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub role: Option<RoleArg>,

    #[arg(long)]
    pub hostname: Option<String>,

    #[arg(long = "management-ip")]
    pub management_ip: Option<String>,

    /// Override the derived internal address
    #[arg(long = "internal-ip")]
    pub internal_ip: Option<String>,

    /// Override the derived storage address
    #[arg(long = "storage-ip")]
    pub storage_ip: Option<String>,

    #[arg(long = "controller-ip")]
    pub controller_ip: Option<String>,

    /// Physical interface (auto-detected when omitted)
    #[arg(long)]
    pub interface: Option<String>,

    #[arg(long = "public-block")]
    pub public_block: Option<String>,

    #[arg(long = "public-gateway")]
    pub public_gateway: Option<String>,

    #[arg(long = "ceph-cluster-network")]
    pub ceph_cluster_network: Option<String>,

    #[arg(long = "ceph-public-network")]
    pub ceph_public_network: Option<String>,

    /// Ceph OSD disk (repeatable)
    #[arg(long = "disk")]
    pub disks: Vec<String>,
}

impl NodeArgs {
    /// True when nothing was supplied, i.e. the interactive flow should run
    pub fn is_empty(&self) -> bool {
        self.config.is_none()
            && self.role.is_none()
            && self.hostname.is_none()
            && self.management_ip.is_none()
            && self.internal_ip.is_none()
            && self.storage_ip.is_none()
            && self.controller_ip.is_none()
            && self.interface.is_none()
            && self.public_block.is_none()
            && self.public_gateway.is_none()
            && self.ceph_cluster_network.is_none()
            && self.ceph_public_network.is_none()
            && self.disks.is_empty()
    }

    /// File contents (if any) overlaid with the individual flags
    pub fn to_builder(&self) -> Result<NodeConfigBuilder> {
        let base = match &self.config {
            Some(path) => ConfigLoader::new().load_node_input(path)?,
            None => NodeConfigBuilder::default(),
        };

        let flags = NodeConfigBuilder {
            role: self.role.clone().map(Into::into),
            hostname: self.hostname.clone(),
            management_address: self.management_ip.clone(),
            internal_address: self.internal_ip.clone(),
            storage_address: self.storage_ip.clone(),
            controller_address: self.controller_ip.clone(),
            physical_interface: self.interface.clone(),
            public_ip_block: self.public_block.clone(),
            public_gateway: self.public_gateway.clone(),
            storage_cluster_network: self.ceph_cluster_network.clone(),
            storage_public_network: self.ceph_public_network.clone(),
            storage_disks: if self.disks.is_empty() {
                None
            } else {
                Some(self.disks.clone())
            },
        };

        Ok(base.merge(flags))
    }
}

/// Node role argument for CLI
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum RoleArg {
    Controller,
    Compute,
    Storage,
    Combined,
}

impl From<RoleArg> for NodeRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Controller => NodeRole::Controller,
            RoleArg::Compute => NodeRole::Compute,
            RoleArg::Storage => NodeRole::Storage,
            RoleArg::Combined => NodeRole::Combined,
        }
    }
}

/// Reconfigure scope argument for CLI
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum ScopeArg {
    Network,
    NetworkServices,
    Full,
}

impl From<ScopeArg> for ReconfigureScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Network => ReconfigureScope::NetworkOnly,
            ScopeArg::NetworkServices => ReconfigureScope::NetworkAndServices,
            ScopeArg::Full => ReconfigureScope::Full,
        }
    }
}
