// file: tests/installer_test.rs
// version: 1.0.0
// guid: 4952e2f4-d508-4ca2-a760-f42c7d2e2469

//! Orchestrator behaviour over in-memory phases

mod common;

use cloud_node_installer::config::{NodeConfigBuilder, NodeRole};
use cloud_node_installer::executor::PhaseRunRecord;
use cloud_node_installer::installer::{
    InstallerState, NeverPause, OperatorPrompt, PhaseLedger, ReconfigureScope, RunOutcome,
};
use cloud_node_installer::InstallerError;
use common::{compute_config, controller_config, FakeHost, Harness};
use std::sync::atomic::Ordering;

/// Pauses after the named phase
struct PauseAfter(&'static str);

impl OperatorPrompt for PauseAfter {
    fn pause_after(&self, completed: &PhaseRunRecord, _next_label: &str) -> bool {
        completed.phase == self.0
    }
}

#[tokio::test]
async fn test_fresh_install_runs_role_pipeline_in_order() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut installer = harness.installer(FakeHost::healthy_for(&config));

    // Act
    let outcome = installer.fresh_install(config, &NeverPause).await.unwrap();

    // Assert
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(installer.state(), InstallerState::Complete);
    assert_eq!(
        harness.world.runs(),
        vec!["preflight", "system_prep", "network", "virtualization", "post_install", "verification"]
    );
    let ordinals: Vec<usize> = installer.records().iter().map(|r| r.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3, 5, 7, 8]);
    assert!(installer.store().exists());
    assert!(harness.layout.phase_log("network").exists());

    let ledger = PhaseLedger::load(&harness.settings.ledger_path());
    assert_eq!(ledger.len(), 6);
    assert_eq!(ledger.get("network").map(|e| e.role), Some(NodeRole::Compute));
}

#[tokio::test]
async fn test_failed_phase_halts_pipeline() {
    // Arrange
    let harness = Harness::new();
    harness.world.fail("network");
    let config = compute_config();
    let mut installer = harness.installer(FakeHost::healthy_for(&config));

    // Act
    let err = installer.fresh_install(config, &NeverPause).await.unwrap_err();

    // Assert
    match &err {
        InstallerError::PhaseActionFailed { phase, log } => {
            assert_eq!(phase, "network");
            let content = std::fs::read_to_string(log).unwrap();
            assert!(content.contains("simulated failure"));
            assert!(content.contains("STATUS: FAILED"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 1);
    assert_eq!(installer.state(), InstallerState::Halted);
    assert_eq!(harness.world.runs(), vec!["preflight", "system_prep", "network"]);
    assert!(!PhaseLedger::load(&harness.settings.ledger_path()).contains("network"));
}

#[tokio::test]
async fn test_continue_resumes_from_first_unsatisfied_phase() {
    // Arrange
    let harness = Harness::new();
    harness.world.fail("network");
    let config = compute_config();
    let mut first = harness.installer(FakeHost::healthy_for(&config));
    assert!(first.fresh_install(config.clone(), &NeverPause).await.is_err());
    harness.world.heal("network");
    harness.world.reset_runs();

    // Act
    let mut second = harness.installer(FakeHost::healthy_for(&config));
    let outcome = second.continue_install(&NeverPause).await.unwrap();

    // Assert
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(
        harness.world.runs(),
        vec!["network", "virtualization", "post_install", "verification"]
    );
}

#[tokio::test]
async fn test_continue_with_nothing_pending_only_verifies() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut first = harness.installer(FakeHost::healthy_for(&config));
    first.fresh_install(config.clone(), &NeverPause).await.unwrap();
    harness.world.reset_runs();

    // Act
    let mut second = harness.installer(FakeHost::healthy_for(&config));
    let outcome = second.continue_install(&NeverPause).await.unwrap();

    // Assert
    assert!(harness.world.runs().is_empty());
    match outcome {
        RunOutcome::Verified(run) => {
            assert!(run.report.passed());
            assert!(run.artifact.is_some_and(|p| p.exists()));
        }
        other => panic!("expected verification only, got {other:?}"),
    }
}

#[tokio::test]
async fn test_continue_requeues_drifted_phase() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut first = harness.installer(FakeHost::healthy_for(&config));
    first.fresh_install(config.clone(), &NeverPause).await.unwrap();
    harness.world.revert("virtualization");
    harness.world.reset_runs();

    // Act
    let mut second = harness.installer(FakeHost::healthy_for(&config));
    let pending = second.pending_phases(&config).await;
    second.continue_install(&NeverPause).await.unwrap();

    // Assert
    let names: Vec<&str> = pending.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["virtualization"]);
    assert_eq!(harness.world.runs(), vec!["virtualization", "verification"]);
}

#[tokio::test]
async fn test_operator_pause_stops_between_phases() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut installer = harness.installer(FakeHost::healthy_for(&config));

    // Act
    let outcome = installer
        .fresh_install(config, &PauseAfter("system_prep"))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        outcome,
        RunOutcome::Paused {
            after: "system_prep".to_string()
        }
    );
    assert_eq!(installer.state(), InstallerState::Halted);
    assert_eq!(harness.world.runs(), vec!["preflight", "system_prep"]);
}

#[tokio::test]
async fn test_interrupt_stops_before_next_phase() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut installer = harness.installer(FakeHost::healthy_for(&config));
    installer.interrupt_flag().store(true, Ordering::SeqCst);

    // Act
    let err = installer.fresh_install(config, &NeverPause).await.unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), 130);
    assert!(harness.world.runs().is_empty());
    assert_eq!(installer.state(), InstallerState::Halted);
}

#[tokio::test]
async fn test_network_only_reconfigure() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut first = harness.installer(FakeHost::healthy_for(&config));
    first.fresh_install(config.clone(), &NeverPause).await.unwrap();
    harness.world.reset_runs();

    let moved = NodeConfigBuilder::from(&config)
        .management_address("10.0.0.21")
        .build()
        .unwrap();

    // Act
    let mut second = harness.installer(FakeHost::healthy_for(&moved));
    let outcome = second
        .reconfigure(moved.clone(), ReconfigureScope::NetworkOnly, &NeverPause)
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(harness.world.runs(), vec!["network"]);
    assert_eq!(second.store().load().unwrap(), moved);
    let backups = second.store().list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    let backup: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&backups[0]).unwrap()).unwrap();
    assert_eq!(backup["management_address"], "10.0.0.11");
}

#[tokio::test]
async fn test_role_change_requires_full_reconfigure() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut first = harness.installer(FakeHost::healthy_for(&config));
    first.fresh_install(config.clone(), &NeverPause).await.unwrap();
    harness.world.reset_runs();
    let controller = controller_config();

    // Act
    let mut second = harness.installer(FakeHost::healthy_for(&controller));
    let err = second
        .reconfigure(controller, ReconfigureScope::NetworkAndServices, &NeverPause)
        .await
        .unwrap_err();

    // Assert
    assert!(err.is_configuration_error());
    assert!(harness.world.runs().is_empty());
    assert_eq!(second.store().load().unwrap(), config);
    assert!(second.store().list_backups().unwrap().is_empty());
}

#[tokio::test]
async fn test_full_reconfigure_switches_role() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut first = harness.installer(FakeHost::healthy_for(&config));
    first.fresh_install(config, &NeverPause).await.unwrap();
    harness.world.reset_runs();
    let controller = controller_config();

    // Act
    let mut second = harness.installer(FakeHost::healthy_for(&controller));
    second
        .reconfigure(controller, ReconfigureScope::Full, &NeverPause)
        .await
        .unwrap();

    // Assert
    assert_eq!(
        harness.world.runs(),
        vec!["preflight", "system_prep", "network", "control_plane", "post_install", "verification"]
    );
    let ledger = PhaseLedger::load(&harness.settings.ledger_path());
    assert!(!ledger.contains("virtualization"));
}

#[tokio::test]
async fn test_continue_without_config() {
    // Arrange
    let harness = Harness::new();
    let mut installer = harness.installer(FakeHost::default());
    assert_eq!(installer.state(), InstallerState::NeedsConfig);

    // Act
    let err = installer.continue_install(&NeverPause).await.unwrap_err();

    // Assert
    assert!(matches!(err, InstallerError::ConfigNotFound(_)));
    assert_eq!(err.exit_code(), 3);
    assert!(harness.world.runs().is_empty());
}

#[tokio::test]
async fn test_dry_run_install_leaves_persisted_state_untouched() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut first = harness.installer(FakeHost::healthy_for(&config));
    first.fresh_install(config, &NeverPause).await.unwrap();
    let saved = std::fs::read(harness.settings.node_config_path()).unwrap();
    let ledger = std::fs::read(harness.settings.ledger_path()).unwrap();
    harness.world.reset_runs();
    let controller = controller_config();

    // Act
    let mut dry = harness
        .installer(FakeHost::healthy_for(&controller))
        .with_dry_run(true);
    dry.fresh_install(controller, &NeverPause).await.unwrap();

    // Assert
    assert_eq!(harness.world.runs().len(), 6);
    assert_eq!(std::fs::read(harness.settings.node_config_path()).unwrap(), saved);
    assert_eq!(std::fs::read(harness.settings.ledger_path()).unwrap(), ledger);
}

#[tokio::test]
async fn test_dry_run_install_on_empty_config_dir_writes_nothing() {
    // Arrange
    let harness = Harness::new();
    let config = controller_config();
    let mut installer = harness
        .installer(FakeHost::healthy_for(&config))
        .with_dry_run(true);

    // Act
    installer.fresh_install(config, &NeverPause).await.unwrap();

    // Assert
    assert!(!harness.settings.node_config_path().exists());
    assert!(!harness.settings.ledger_path().exists());
}

#[tokio::test]
async fn test_dry_run_reconfigure_keeps_config_and_makes_no_backup() {
    // Arrange
    let harness = Harness::new();
    let config = compute_config();
    let mut first = harness.installer(FakeHost::healthy_for(&config));
    first.fresh_install(config.clone(), &NeverPause).await.unwrap();
    harness.world.reset_runs();
    let moved = NodeConfigBuilder::from(&config)
        .management_address("10.0.0.21")
        .build()
        .unwrap();

    // Act
    let mut dry = harness
        .installer(FakeHost::healthy_for(&moved))
        .with_dry_run(true);
    dry.reconfigure(moved, ReconfigureScope::NetworkOnly, &NeverPause)
        .await
        .unwrap();

    // Assert
    assert_eq!(harness.world.runs(), vec!["network"]);
    assert_eq!(dry.store().load().unwrap(), config);
    assert!(dry.store().list_backups().unwrap().is_empty());
}
