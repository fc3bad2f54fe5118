// file: src/phases/virtualization.rs
// version: 1.0.0
// guid: f9da60b4-569d-418d-8510-6881259ab3f5

//! KVM/libvirt and the OVN chassis on compute nodes

use super::control_plane::SB_PORT;
use super::script::Script;
use super::{ActionOutput, Phase, PhaseCategory, PhaseContext};

/// Virtualization overlay phase
pub struct VirtualizationPhase;

#[async_trait::async_trait]
impl Phase for VirtualizationPhase {
    fn name(&self) -> &'static str {
        "virtualization"
    }

    fn label(&self) -> &'static str {
        "Compute Services"
    }

    fn category(&self) -> PhaseCategory {
        PhaseCategory::Virtualization
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput {
        let mut script = Script::new(ctx.runner);
        let config = ctx.config;

        let result = async {
            script
                .step(
                    "Install hypervisor and OVN host",
                    "DEBIAN_FRONTEND=noninteractive apt-get install -y -q qemu-kvm libvirt-daemon-system ovn-host openvswitch-switch",
                )
                .await?;
            script
                .step(
                    "Register OVN chassis",
                    &format!(
                        "ovs-vsctl set open_vswitch . external-ids:system-id={} external-ids:ovn-remote=tcp:{}:{} external-ids:ovn-encap-type=geneve external-ids:ovn-encap-ip={}",
                        config.hostname, config.controller_address, SB_PORT, config.internal_address
                    ),
                )
                .await?;
            script
                .step(
                    "Start overlay and hypervisor services",
                    "systemctl enable --now openvswitch-switch ovn-controller libvirtd",
                )
                .await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        script.finish(result)
    }

    async fn is_satisfied(&self, ctx: &PhaseContext<'_>) -> bool {
        ctx.host.service_active("ovn-controller").await.is_up()
            && ctx.host.service_active("libvirtd").await.is_up()
    }
}
