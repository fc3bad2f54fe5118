// file: src/phases/network.rs
// version: 1.0.0
// guid: 61be4c05-e8f4-4067-a28a-a24762aa0a38

//! VLAN segments on the physical interface
//!
//! Which segments exist depends on the role: controllers get management
//! only, compute nodes add internal and storage, storage nodes add storage,
//! combined nodes get all four.

use super::script::Script;
use super::{ActionOutput, Phase, PhaseCategory, PhaseContext};
use crate::config::{segments_for_role, InstallerSettings, NetworkSegment, NodeConfig};

/// Ordered (description, command) pairs that bring up the role's segments.
///
/// Every command is safe to repeat.
pub fn plan(config: &NodeConfig, settings: &InstallerSettings) -> Vec<(String, String)> {
    let segments = segments_for_role(config.role);
    let physical = &config.physical_interface;
    let mut steps = vec![("Load 802.1q module".to_string(), "modprobe 8021q".to_string())];

    let max_mtu = segments.iter().map(|s| s.mtu()).max().unwrap_or(1500);
    steps.push((
        format!("Bring up {}", physical),
        format!("ip link set dev {} mtu {} up", physical, max_mtu),
    ));

    for segment in &segments {
        let iface = segment.interface_name();
        steps.push((
            format!("Create VLAN {} ({})", iface, segment.vlan_id()),
            format!(
                "ip link show {iface} >/dev/null 2>&1 || ip link add link {physical} name {iface} type vlan id {vlan}",
                iface = iface,
                physical = physical,
                vlan = segment.vlan_id()
            ),
        ));
        steps.push((
            format!("Bring up {}", iface),
            format!("ip link set dev {} mtu {} up", iface, segment.mtu()),
        ));
        if let Some(address) = config.segment_address(*segment) {
            steps.push((
                format!("Assign {} to {}", address, iface),
                format!("ip addr replace {}/{} dev {}", address, segment.prefix_len(), iface),
            ));
        }
    }

    if segments.contains(&NetworkSegment::Management) {
        steps.push((
            "Default route via management gateway".to_string(),
            format!(
                "ip route replace default via {} dev {}",
                settings.management_gateway,
                NetworkSegment::Management.interface_name()
            ),
        ));
    }

    steps
}

/// Network configuration phase
pub struct NetworkPhase;

#[async_trait::async_trait]
impl Phase for NetworkPhase {
    fn name(&self) -> &'static str {
        "network"
    }

    fn label(&self) -> &'static str {
        "Network Configuration"
    }

    fn category(&self) -> PhaseCategory {
        PhaseCategory::Network
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput {
        let mut script = Script::new(ctx.runner);
        let steps = plan(ctx.config, ctx.settings);

        let result = async {
            for (description, command) in &steps {
                script.step(description, command).await?;
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;

        script.finish(result)
    }

    async fn is_satisfied(&self, ctx: &PhaseContext<'_>) -> bool {
        for segment in segments_for_role(ctx.config.role) {
            let Some(found) = ctx.host.interface_addresses(segment.interface_name()).await else {
                return false;
            };
            if let Some(expected) = ctx.config.segment_address(segment) {
                if !found.contains(&expected) {
                    return false;
                }
            }
        }
        true
    }
}
