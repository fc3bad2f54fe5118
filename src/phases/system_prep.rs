// file: src/phases/system_prep.rs
// version: 1.0.0
// guid: ad02474c-ae3c-4500-a349-83986dc1f727

//! Base packages, hostname, kernel modules and time sync

use super::script::Script;
use super::{ActionOutput, Phase, PhaseCategory, PhaseContext};

/// Packages every node role needs
pub const BASE_PACKAGES: &[&str] = &["chrony", "vlan", "bridge-utils", "curl", "jq", "iputils-ping"];

const MODULES_FILE: &str = "/etc/modules-load.d/cloud-provider.conf";
const SYSCTL_FILE: &str = "/etc/sysctl.d/90-cloud-provider.conf";

/// System preparation phase
pub struct SystemPrepPhase;

#[async_trait::async_trait]
impl Phase for SystemPrepPhase {
    fn name(&self) -> &'static str {
        "system_prep"
    }

    fn label(&self) -> &'static str {
        "System Preparation"
    }

    fn category(&self) -> PhaseCategory {
        PhaseCategory::SystemPrep
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput {
        let mut script = Script::new(ctx.runner);
        let hostname = &ctx.config.hostname;

        let result = async {
            script
                .step("Refresh package index", "DEBIAN_FRONTEND=noninteractive apt-get update -q")
                .await?;
            script
                .step(
                    "Install base packages",
                    &format!(
                        "DEBIAN_FRONTEND=noninteractive apt-get install -y -q {}",
                        BASE_PACKAGES.join(" ")
                    ),
                )
                .await?;
            script
                .step("Set hostname", &format!("hostnamectl set-hostname '{}'", hostname))
                .await?;
            script
                .step(
                    "Load 802.1q module",
                    &format!("modprobe 8021q && printf '8021q\\n' > {}", MODULES_FILE),
                )
                .await?;
            script
                .step(
                    "Enable IP forwarding",
                    &format!(
                        "printf 'net.ipv4.ip_forward = 1\\n' > {} && sysctl -q -p {}",
                        SYSCTL_FILE, SYSCTL_FILE
                    ),
                )
                .await?;
            script
                .step("Enable time sync", "systemctl enable --now chrony")
                .await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        script.finish(result)
    }

    async fn is_satisfied(&self, ctx: &PhaseContext<'_>) -> bool {
        ctx.host.service_active("chrony").await.is_up()
            && ctx
                .host
                .command_succeeds(&format!("grep -qx 8021q {} && lsmod | grep -q '^8021q'", MODULES_FILE))
                .await
                .is_up()
            && ctx
                .host
                .command_succeeds(&format!("test \"$(hostname)\" = '{}'", ctx.config.hostname))
                .await
                .is_up()
    }
}
