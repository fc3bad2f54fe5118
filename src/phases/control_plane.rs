// file: src/phases/control_plane.rs
// version: 1.0.0
// guid: a6b2f83a-c2ff-455d-bbc9-4f530334dfd1

//! OVN central databases and northd on controller nodes

use super::script::Script;
use super::{ActionOutput, Phase, PhaseCategory, PhaseContext};

/// OVN northbound database port
pub const NB_PORT: u16 = 6641;
/// OVN southbound database port
pub const SB_PORT: u16 = 6642;

/// Control-plane services phase
pub struct ControlPlanePhase;

#[async_trait::async_trait]
impl Phase for ControlPlanePhase {
    fn name(&self) -> &'static str {
        "control_plane"
    }

    fn label(&self) -> &'static str {
        "Controller Services"
    }

    fn category(&self) -> PhaseCategory {
        PhaseCategory::ControlPlane
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput {
        let mut script = Script::new(ctx.runner);
        let listen = ctx.config.management_address;

        let result = async {
            script
                .step(
                    "Install OVN central",
                    "DEBIAN_FRONTEND=noninteractive apt-get install -y -q ovn-central openvswitch-switch",
                )
                .await?;
            script
                .step("Start OVN central", "systemctl enable --now ovn-central")
                .await?;
            script
                .step(
                    "Expose northbound database",
                    &format!("ovn-nbctl set-connection ptcp:{}:{}", NB_PORT, listen),
                )
                .await?;
            script
                .step(
                    "Expose southbound database",
                    &format!("ovn-sbctl set-connection ptcp:{}:{}", SB_PORT, listen),
                )
                .await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        script.finish(result)
    }

    async fn is_satisfied(&self, ctx: &PhaseContext<'_>) -> bool {
        ctx.host.service_active("ovn-northd").await.is_up()
    }
}
