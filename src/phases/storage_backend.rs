// file: src/phases/storage_backend.rs
// version: 1.0.0
// guid: 891b2c84-9d05-49b7-9732-76383898269d

//! Ceph OSDs on storage nodes

use super::script::Script;
use super::{ActionOutput, Phase, PhaseCategory, PhaseContext};
use anyhow::anyhow;

/// Storage backend phase
pub struct StorageBackendPhase;

#[async_trait::async_trait]
impl Phase for StorageBackendPhase {
    fn name(&self) -> &'static str {
        "storage_backend"
    }

    fn label(&self) -> &'static str {
        "Storage Services"
    }

    fn category(&self) -> PhaseCategory {
        PhaseCategory::StorageBackend
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput {
        let mut script = Script::new(ctx.runner);
        let storage = ctx.config.storage.as_ref();

        let result = async {
            let storage = storage.ok_or_else(|| anyhow!("node has no storage settings"))?;
            script.note(&format!(
                "Cluster network {}, public network {}",
                storage.cluster_network, storage.public_network
            ));
            script
                .step(
                    "Install Ceph",
                    "DEBIAN_FRONTEND=noninteractive apt-get install -y -q ceph-osd ceph-volume",
                )
                .await?;
            for disk in &storage.disks {
                script
                    .step(
                        &format!("Prepare OSD on {}", disk),
                        &format!(
                            "ceph-volume lvm list /dev/{disk} >/dev/null 2>&1 || ceph-volume lvm create --data /dev/{disk}",
                            disk = disk
                        ),
                    )
                    .await?;
            }
            script
                .step("Start Ceph services", "systemctl enable --now ceph.target")
                .await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        script.finish(result)
    }

    async fn is_satisfied(&self, ctx: &PhaseContext<'_>) -> bool {
        ctx.host.service_active("ceph.target").await.is_up()
    }
}
