// file: src/phases/post_install.rs
// version: 1.0.0
// guid: 1fb91d70-cf87-4d5b-8486-a7e0a87065ab

//! Final host tweaks and the completion marker

use super::script::Script;
use super::{ActionOutput, Phase, PhaseCategory, PhaseContext};

/// Post-installation phase
pub struct PostInstallPhase;

#[async_trait::async_trait]
impl Phase for PostInstallPhase {
    fn name(&self) -> &'static str {
        "post_install"
    }

    fn label(&self) -> &'static str {
        "Post-Installation"
    }

    fn category(&self) -> PhaseCategory {
        PhaseCategory::PostInstall
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput {
        let mut script = Script::new(ctx.runner);
        let marker = ctx.settings.post_install_marker();
        let dir = ctx.settings.config_dir.display().to_string();

        let result = async {
            script
                .step("Reload systemd units", "systemctl daemon-reload")
                .await?;
            script
                .step(
                    "Write completion marker",
                    &format!(
                        "mkdir -p '{dir}' && printf 'role=%s\\nsession=%s\\ncompleted=%s\\n' '{role}' '{session}' \"$(date -Is)\" > '{marker}'",
                        dir = dir,
                        role = ctx.config.role,
                        session = ctx.session_id,
                        marker = marker.display()
                    ),
                )
                .await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        script.finish(result)
    }

    async fn is_satisfied(&self, ctx: &PhaseContext<'_>) -> bool {
        ctx.host.path_exists(&ctx.settings.post_install_marker())
    }
}
