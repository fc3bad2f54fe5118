// file: src/phases/verification.rs
// version: 1.0.0
// guid: 5ee43057-c8b1-4951-afbf-85d9649f9cbe

//! Terminal pipeline phase: run the verification engine and keep its report

use super::{ActionOutput, Phase, PhaseCategory, PhaseContext};
use crate::verification::VerificationEngine;
use tracing::{error, info};

/// Verification phase. Its action never fails: findings are reported, not raised.
pub struct VerificationPhase;

#[async_trait::async_trait]
impl Phase for VerificationPhase {
    fn name(&self) -> &'static str {
        "verification"
    }

    fn label(&self) -> &'static str {
        "Verification"
    }

    fn category(&self) -> PhaseCategory {
        PhaseCategory::Verification
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> ActionOutput {
        let report = VerificationEngine::new(ctx.host, ctx.config, ctx.settings).run().await;
        let mut output = report.render_text();

        match report.write_artifacts(&ctx.settings.reports_dir()) {
            Ok(path) => {
                info!("Verification report written to {}", path.display());
                output.push_str(&format!("Report: {}\n", path.display()));
            }
            Err(e) => {
                error!("Could not write verification report: {}", e);
                output.push_str(&format!("Report could not be written: {}\n", e));
            }
        }

        ActionOutput::success(output)
    }

    /// Nothing to apply; the orchestrator schedules verification explicitly
    async fn is_satisfied(&self, _ctx: &PhaseContext<'_>) -> bool {
        true
    }
}
