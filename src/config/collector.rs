// file: src/config/collector.rs
// version: 1.0.0
// guid: fc236aa3-1f02-4091-a130-57778a4186b4

//! Interactive collection of a node configuration
//!
//! The collector only talks to a [`Prompter`], so the terminal front end and
//! scripted answers in tests drive exactly the same flow.

use super::node::{DEFAULT_PUBLIC_BLOCK, DEFAULT_PUBLIC_GATEWAY, DEFAULT_STORAGE_NETWORK};
use super::{NodeConfig, NodeConfigBuilder, NodeRole};
use crate::utils::validation::{self, derive_address, INTERNAL_OCTET, STORAGE_OCTET};
use crate::{InstallerError, Result};
use std::net::Ipv4Addr;
use tracing::debug;

/// Default controller address offered to compute and storage nodes
pub const DEFAULT_CONTROLLER_ADDRESS: &str = "10.0.0.10";

/// Source of operator answers
pub trait Prompter {
    /// Ask for a free-form value; an empty answer selects `default`
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Pick one of `options`, returning its index
    fn choose(&mut self, prompt: &str, options: &[String], default: usize) -> Result<usize>;

    /// Yes/no question
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Informational output shown between questions
    fn note(&mut self, _message: &str) {}
}

/// Walk the operator through every field the chosen role needs.
///
/// `detected_interface` is offered as the default physical interface and
/// `existing` (during a reconfigure) supplies defaults for every other answer.
pub fn collect_interactive(
    prompter: &mut dyn Prompter,
    detected_interface: Option<&str>,
    existing: Option<&NodeConfig>,
) -> Result<NodeConfig> {
    let role_options: Vec<String> = NodeRole::ALL
        .iter()
        .map(|role| role.description().to_string())
        .collect();
    let default_role = existing
        .and_then(|c| NodeRole::ALL.iter().position(|r| *r == c.role))
        .unwrap_or(0);
    let role = NodeRole::ALL[prompter.choose("Select node type", &role_options, default_role)?];
    debug!("Collecting configuration for {} node", role);

    let hostname_default = existing
        .map(|c| c.hostname.clone())
        .unwrap_or_else(crate::utils::system::SystemUtils::hostname);
    let hostname = ask_until(
        prompter,
        "Hostname",
        Some(&hostname_default),
        validation::validate_hostname,
        "Invalid hostname",
    )?;

    let management_default = existing.map(|c| c.management_address.to_string());
    let management = ask_ipv4(prompter, "Management IP address (10.0.0.x)", management_default.as_deref())?;

    prompter.note(&format!(
        "Internal IP: {} (auto-derived)",
        derive_address(management, INTERNAL_OCTET)
    ));
    prompter.note(&format!(
        "Storage IP:  {} (auto-derived)",
        derive_address(management, STORAGE_OCTET)
    ));

    let interface_default = detected_interface
        .map(str::to_string)
        .or_else(|| existing.map(|c| c.physical_interface.clone()));
    let interface = ask_until(
        prompter,
        "Physical network interface",
        interface_default.as_deref(),
        validation::validate_interface_name,
        "Invalid interface name",
    )?;

    let mut builder = NodeConfigBuilder::default()
        .role(role)
        .hostname(hostname)
        .management_address(management.to_string())
        .physical_interface(interface);

    if role.needs_remote_controller() {
        let default = existing
            .filter(|c| c.role.needs_remote_controller())
            .map(|c| c.controller_address.to_string())
            .unwrap_or_else(|| DEFAULT_CONTROLLER_ADDRESS.to_string());
        let controller = ask_ipv4(prompter, "Controller IP address", Some(&default))?;
        builder = builder.controller_address(controller.to_string());
    }

    if role.has_public_network() {
        let public = existing.and_then(|c| c.public_network.as_ref());
        let block_default = public
            .map(|p| p.ip_block.to_string())
            .unwrap_or_else(|| DEFAULT_PUBLIC_BLOCK.to_string());
        let gateway_default = public
            .map(|p| p.gateway.to_string())
            .unwrap_or_else(|| DEFAULT_PUBLIC_GATEWAY.to_string());
        let block = ask_until(
            prompter,
            "Public IP block (CIDR)",
            Some(&block_default),
            validation::validate_cidr,
            "Invalid CIDR",
        )?;
        let gateway = ask_ipv4(prompter, "Public gateway", Some(&gateway_default))?;
        builder = builder.public_network(block, gateway.to_string());
    }

    if role.has_storage_settings() {
        let storage = existing.and_then(|c| c.storage.as_ref());
        let cluster_default = storage
            .map(|s| s.cluster_network.to_string())
            .unwrap_or_else(|| DEFAULT_STORAGE_NETWORK.to_string());
        let public_default = storage
            .map(|s| s.public_network.to_string())
            .unwrap_or_else(|| DEFAULT_STORAGE_NETWORK.to_string());
        let disks_default = storage.map(|s| s.disks.join(" "));

        let cluster = ask_until(
            prompter,
            "Ceph cluster network",
            Some(&cluster_default),
            validation::validate_cidr,
            "Invalid CIDR",
        )?;
        let public = ask_until(
            prompter,
            "Ceph public network",
            Some(&public_default),
            validation::validate_cidr,
            "Invalid CIDR",
        )?;
        let disks = ask_until(
            prompter,
            "Ceph OSD disks (space separated, e.g. sdb sdc)",
            disks_default.as_deref(),
            |answer| role != NodeRole::Storage || !split_disks(answer).is_empty(),
            "A storage node needs at least one disk",
        )?;
        builder = builder
            .storage_networks(cluster, public)
            .storage_disks(split_disks(&disks));
    }

    let config = builder.build()?;

    prompter.note("Configuration Summary:");
    for line in config.render_summary().lines() {
        prompter.note(line);
    }

    if !prompter.confirm("Is this configuration correct?", true)? {
        return Err(InstallerError::cancelled("Configuration was not confirmed"));
    }

    Ok(config)
}

fn split_disks(answer: &str) -> Vec<String> {
    answer
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

fn ask_ipv4(prompter: &mut dyn Prompter, prompt: &str, default: Option<&str>) -> Result<Ipv4Addr> {
    let answer = ask_until(prompter, prompt, default, validation::validate_ipv4, "Invalid IP address")?;
    validation::parse_ipv4(prompt, &answer)
}

fn ask_until(
    prompter: &mut dyn Prompter,
    prompt: &str,
    default: Option<&str>,
    valid: impl Fn(&str) -> bool,
    complaint: &str,
) -> Result<String> {
    loop {
        let answer = prompter.ask(prompt, default)?;
        let answer = answer.trim();
        let answer = if answer.is_empty() { default.unwrap_or("") } else { answer };
        if !answer.is_empty() && valid(answer) {
            return Ok(answer.to_string());
        }
        prompter.note(&format!("{}: '{}'", complaint, answer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers; an empty string means "accept the default"
    struct ScriptedPrompter {
        answers: VecDeque<String>,
        notes: Vec<String>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                notes: Vec::new(),
            }
        }

        fn next(&mut self, prompt: &str) -> Result<String> {
            self.answers
                .pop_front()
                .ok_or_else(|| InstallerError::cancelled(format!("no scripted answer for '{}'", prompt)))
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
            let answer = self.next(prompt)?;
            if answer.is_empty() {
                return Ok(default.unwrap_or("").to_string());
            }
            Ok(answer)
        }

        fn choose(&mut self, prompt: &str, _options: &[String], default: usize) -> Result<usize> {
            let answer = self.next(prompt)?;
            if answer.is_empty() {
                return Ok(default);
            }
            answer
                .parse::<usize>()
                .map(|n| n - 1)
                .map_err(|_| InstallerError::validation("bad choice"))
        }

        fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
            let answer = self.next(prompt)?;
            Ok(match answer.as_str() {
                "" => default,
                "y" => true,
                _ => false,
            })
        }

        fn note(&mut self, message: &str) {
            self.notes.push(message.to_string());
        }
    }

    #[test]
    fn test_compute_node_collection() -> Result<()> {
        // Arrange
        let mut prompter = ScriptedPrompter::new(&[
            "2",         // compute
            "compute-01",
            "10.0.0.11",
            "",          // accept detected interface
            "10.0.0.10",
            "y",
        ]);

        // Act
        let config = collect_interactive(&mut prompter, Some("eno1"), None)?;

        // Assert
        assert_eq!(config.role, NodeRole::Compute);
        assert_eq!(config.physical_interface, "eno1");
        assert_eq!(config.internal_address.to_string(), "10.0.1.11");
        assert_eq!(config.storage_address.to_string(), "10.0.2.11");
        assert!(prompter.notes.iter().any(|n| n.contains("10.0.1.11")));
        Ok(())
    }

    #[test]
    fn test_invalid_answers_are_asked_again() -> Result<()> {
        // Arrange
        let mut prompter = ScriptedPrompter::new(&[
            "1",
            "ctl'; reboot; echo '",
            "ctl",
            "10.0.0.256",
            "10.0.0.10",
            "bad iface name!",
            "eth0",
            "", // public block default
            "", // public gateway default
            "",
        ]);

        // Act
        let config = collect_interactive(&mut prompter, None, None)?;

        // Assert
        assert_eq!(config.role, NodeRole::Controller);
        assert_eq!(config.controller_address, config.management_address);
        assert_eq!(
            config.public_network.as_ref().map(|p| p.gateway.to_string()),
            Some(DEFAULT_PUBLIC_GATEWAY.to_string())
        );
        assert_eq!(config.hostname, "ctl");
        assert!(prompter.notes.iter().any(|n| n.starts_with("Invalid hostname")));
        assert!(prompter.notes.iter().any(|n| n.starts_with("Invalid IP address")));
        assert!(prompter.notes.iter().any(|n| n.starts_with("Invalid interface name")));
        Ok(())
    }

    #[test]
    fn test_storage_node_requires_disks() -> Result<()> {
        // Arrange
        let mut prompter = ScriptedPrompter::new(&[
            "3", "st-01", "10.0.0.21", "eth0", "10.0.0.10", "", "", "", "/dev/sdb, sdc", "",
        ]);

        // Act
        let config = collect_interactive(&mut prompter, None, None)?;

        // Assert
        let storage = config.storage.expect("storage settings");
        assert_eq!(storage.disks, vec!["sdb".to_string(), "sdc".to_string()]);
        assert!(prompter
            .notes
            .iter()
            .any(|n| n.starts_with("A storage node needs at least one disk")));
        Ok(())
    }

    #[test]
    fn test_existing_config_supplies_defaults() -> Result<()> {
        // Arrange
        let existing = NodeConfig::builder()
            .role(NodeRole::Compute)
            .hostname("compute-07")
            .management_address("10.0.0.17")
            .controller_address("10.0.0.10")
            .physical_interface("eth1")
            .build()?;
        let mut prompter = ScriptedPrompter::new(&["", "", "", "", "", ""]);

        // Act
        let config = collect_interactive(&mut prompter, None, Some(&existing))?;

        // Assert
        assert_eq!(config, existing);
        Ok(())
    }

    #[test]
    fn test_declined_confirmation_is_cancelled() {
        let mut prompter = ScriptedPrompter::new(&["2", "c", "10.0.0.11", "eth0", "", "n"]);

        let err = collect_interactive(&mut prompter, None, None).unwrap_err();

        assert_eq!(err.exit_code(), 130);
    }
}
