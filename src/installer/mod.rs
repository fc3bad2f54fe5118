// file: src/installer/mod.rs
// version: 2.0.0
// guid: 2e7105a8-bc05-43c6-80a7-4e447e8212b8

//! Orchestrator: the top-level installation state machine
//!
//! `NeedsConfig -> Configured -> {RunningFresh, RunningContinue,
//! RunningReconfigure, Verifying} -> {Complete, Halted}`
//!
//! Phases run strictly one after another. A failed phase halts the pipeline
//! with [`InstallerError::PhaseActionFailed`]; nothing after it runs and no
//! rollback is attempted.

pub mod ledger;

pub use ledger::{LedgerEntry, PhaseLedger};

use crate::config::{ConfigStore, InstallerSettings, NodeConfig};
use crate::executor::{PhaseExecutor, PhaseRunRecord};
use crate::host::{CommandRunner, HostProbe};
use crate::logging::{LogLayout, AUDIT_TARGET};
use crate::phases::{PhaseCategory, PhaseContext, PhaseRegistry, RegisteredPhase};
use crate::verification::{VerificationEngine, VerificationReport};
use crate::{InstallerError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerState {
    NeedsConfig,
    Configured,
    RunningFresh,
    RunningContinue,
    RunningReconfigure,
    Verifying,
    Complete,
    Halted,
}

/// Which phases a reconfigure re-runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconfigureScope {
    /// Only the network phase
    NetworkOnly,
    /// Network plus control-plane, virtualization and storage services
    NetworkAndServices,
    /// The whole role pipeline
    Full,
}

impl ReconfigureScope {
    pub fn includes(&self, category: PhaseCategory) -> bool {
        match self {
            ReconfigureScope::NetworkOnly => category == PhaseCategory::Network,
            ReconfigureScope::NetworkAndServices => {
                category == PhaseCategory::Network || category.is_service()
            }
            ReconfigureScope::Full => true,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReconfigureScope::NetworkOnly => "Network configuration only",
            ReconfigureScope::NetworkAndServices => "Network and services",
            ReconfigureScope::Full => "Full reinstall",
        }
    }
}

/// How a pipeline run ended without a fatal error
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every scheduled phase succeeded
    Completed,
    /// The operator paused after the named phase
    Paused { after: String },
    /// Nothing was pending, so only verification ran
    Verified(Box<VerificationRun>),
}

/// A verification-only run and where its report went
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRun {
    pub report: VerificationReport,
    /// `None` if the artifact could not be written
    pub artifact: Option<PathBuf>,
}

/// Lets the operator stop between phases
pub trait OperatorPrompt {
    /// Called after every successful phase except the last one of the run
    fn pause_after(&self, completed: &PhaseRunRecord, next_label: &str) -> bool;
}

/// Runs straight through (unattended mode)
pub struct NeverPause;

impl OperatorPrompt for NeverPause {
    fn pause_after(&self, _completed: &PhaseRunRecord, _next_label: &str) -> bool {
        false
    }
}

/// Main installer orchestrator
pub struct Installer {
    session_id: Uuid,
    settings: InstallerSettings,
    store: ConfigStore,
    registry: PhaseRegistry,
    executor: PhaseExecutor,
    runner: Arc<dyn CommandRunner>,
    host: Arc<dyn HostProbe>,
    interrupted: Arc<AtomicBool>,
    state: InstallerState,
    records: Vec<PhaseRunRecord>,
    dry_run: bool,
}

impl Installer {
    /// Create a new installer instance over the standard pipeline
    pub fn new(
        settings: InstallerSettings,
        layout: LogLayout,
        runner: Arc<dyn CommandRunner>,
        host: Arc<dyn HostProbe>,
    ) -> Self {
        let session_id = Uuid::new_v4();
        info!("Creating new installer session: {}", session_id);

        let store = ConfigStore::new(settings.node_config_path());
        let state = if store.exists() {
            InstallerState::Configured
        } else {
            InstallerState::NeedsConfig
        };

        Self {
            session_id,
            settings,
            store,
            registry: PhaseRegistry::standard(),
            executor: PhaseExecutor::new(layout),
            runner,
            host,
            interrupted: Arc::new(AtomicBool::new(false)),
            state,
            records: Vec::new(),
            dry_run: false,
        }
    }

    /// Leave the persisted configuration and ledger untouched
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replace the phase pipeline
    pub fn with_registry(mut self, registry: PhaseRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Show a spinner while phases run
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.executor.set_progress(show_progress);
        self
    }

    /// Share an externally owned interrupt flag (set by the signal handler)
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> InstallerState {
        self.state
    }

    /// Records of every phase executed by this installer, in order
    pub fn records(&self) -> &[PhaseRunRecord] {
        &self.records
    }

    pub fn settings(&self) -> &InstallerSettings {
        &self.settings
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn registry(&self) -> &PhaseRegistry {
        &self.registry
    }

    /// Load the persisted configuration
    pub fn load_config(&mut self) -> Result<NodeConfig> {
        match self.store.load() {
            Ok(config) => {
                self.state = InstallerState::Configured;
                Ok(config)
            }
            Err(e) => {
                self.state = InstallerState::NeedsConfig;
                Err(e)
            }
        }
    }

    /// Persist `config` and run every applicable phase for its role
    pub async fn fresh_install(&mut self, config: NodeConfig, prompt: &dyn OperatorPrompt) -> Result<RunOutcome> {
        config.validate()?;
        if self.dry_run {
            info!("Dry run: not saving configuration to {}", self.store.path().display());
        } else {
            self.store.save(&config)?;
        }
        self.state = InstallerState::Configured;

        let mut ledger = PhaseLedger::load(&self.settings.ledger_path());
        ledger.clear();
        self.save_ledger(&ledger);

        info!(
            target: AUDIT_TARGET,
            "FRESH INSTALL role={} session={}",
            config.role,
            self.session_id
        );
        let phases = self.registry.for_role(config.role);
        self.run_pipeline(InstallerState::RunningFresh, &config, phases, prompt)
            .await
    }

    /// Resume from live state: re-run every phase whose probe fails, then verify
    pub async fn continue_install(&mut self, prompt: &dyn OperatorPrompt) -> Result<RunOutcome> {
        let config = self.load_config()?;
        let pending = self.pending_phases(&config).await;

        if pending.is_empty() {
            info!("All phases already applied; running verification only");
            let run = self.verify_with(&config).await;
            return Ok(RunOutcome::Verified(Box::new(run)));
        }

        info!(
            target: AUDIT_TARGET,
            "CONTINUE role={} pending={} session={}",
            config.role,
            pending.iter().map(|p| p.name()).collect::<Vec<_>>().join(","),
            self.session_id
        );

        let mut phases = pending;
        phases.extend(
            self.registry
                .for_role(config.role)
                .into_iter()
                .filter(|p| p.phase.category() == PhaseCategory::Verification),
        );
        self.run_pipeline(InstallerState::RunningContinue, &config, phases, prompt)
            .await
    }

    /// Applicable phases whose post-condition probe currently fails, in order.
    ///
    /// The verification phase is never pending; callers schedule it.
    pub async fn pending_phases(&self, config: &NodeConfig) -> Vec<RegisteredPhase> {
        let ledger = PhaseLedger::load(&self.settings.ledger_path());
        let candidates: Vec<RegisteredPhase> = self
            .registry
            .for_role(config.role)
            .into_iter()
            .filter(|p| p.phase.category() != PhaseCategory::Verification)
            .collect();
        let total = candidates.len();

        let mut pending = Vec::new();
        for (i, registered) in candidates.into_iter().enumerate() {
            let ctx = self.context(config, i + 1, total);
            let satisfied = registered.phase.is_satisfied(&ctx).await;
            let recorded = ledger.contains(registered.name());

            match (satisfied, recorded) {
                (false, true) => warn!(
                    "Phase '{}' was recorded complete but its probe now fails; re-queuing",
                    registered.name()
                ),
                (true, false) => info!(
                    "Phase '{}' is satisfied but was never recorded (applied outside the installer?)",
                    registered.name()
                ),
                _ => debug!("Phase '{}': satisfied={}", registered.name(), satisfied),
            }

            if !satisfied {
                pending.push(registered);
            }
        }
        pending
    }

    /// Back up the current configuration, persist `new_config` and re-run the
    /// phases selected by `scope`
    pub async fn reconfigure(
        &mut self,
        new_config: NodeConfig,
        scope: ReconfigureScope,
        prompt: &dyn OperatorPrompt,
    ) -> Result<RunOutcome> {
        let current = self.load_config()?;
        if new_config.role != current.role && scope != ReconfigureScope::Full {
            return Err(InstallerError::validation(format!(
                "Changing the node role from {} to {} requires a full reinstall",
                current.role, new_config.role
            )));
        }
        new_config.validate()?;

        let backup = if self.dry_run {
            info!("Dry run: not backing up or replacing {}", self.store.path().display());
            PathBuf::from("(dry run)")
        } else {
            let backup = self.store.backup()?;
            info!("Previous configuration saved as {}", backup.display());
            self.store.save(&new_config)?;
            backup
        };

        let phases: Vec<RegisteredPhase> = self
            .registry
            .for_role(new_config.role)
            .into_iter()
            .filter(|p| scope.includes(p.phase.category()))
            .collect();

        let mut ledger = PhaseLedger::load(&self.settings.ledger_path());
        if scope == ReconfigureScope::Full {
            ledger.clear();
        } else {
            for phase in &phases {
                ledger.forget(phase.name());
            }
        }
        self.save_ledger(&ledger);

        info!(
            target: AUDIT_TARGET,
            "RECONFIGURE scope={:?} role={} backup={} session={}",
            scope,
            new_config.role,
            backup.display(),
            self.session_id
        );
        self.run_pipeline(InstallerState::RunningReconfigure, &new_config, phases, prompt)
            .await
    }

    /// Run only the verification engine against current live state
    pub async fn verify_only(&mut self) -> Result<VerificationRun> {
        let config = self.load_config()?;
        Ok(self.verify_with(&config).await)
    }

    async fn verify_with(&mut self, config: &NodeConfig) -> VerificationRun {
        self.state = InstallerState::Verifying;
        info!(target: AUDIT_TARGET, "VERIFY role={} session={}", config.role, self.session_id);

        let report = VerificationEngine::new(self.host.as_ref(), config, &self.settings)
            .run()
            .await;

        let artifact = match report.write_artifacts(&self.executor.layout().reports_dir()) {
            Ok(path) => {
                info!("Verification report written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                error!("Could not write verification report: {}", e);
                None
            }
        };

        info!(
            target: AUDIT_TARGET,
            "VERIFY overall={:?} errors={} warnings={}",
            report.overall(),
            report.error_count(),
            report.warning_count()
        );
        self.state = InstallerState::Complete;
        VerificationRun { report, artifact }
    }

    fn context<'a>(&'a self, config: &'a NodeConfig, step_number: usize, total_steps: usize) -> PhaseContext<'a> {
        PhaseContext {
            session_id: self.session_id,
            config,
            settings: &self.settings,
            runner: self.runner.as_ref(),
            host: self.host.as_ref(),
            step_number,
            total_steps,
        }
    }

    fn save_ledger(&self, ledger: &PhaseLedger) {
        if self.dry_run {
            debug!("Dry run: phase ledger not updated");
            return;
        }
        if let Err(e) = ledger.save(&self.settings.ledger_path()) {
            warn!("Could not update phase ledger: {}", e);
        }
    }

    async fn run_pipeline(
        &mut self,
        running: InstallerState,
        config: &NodeConfig,
        phases: Vec<RegisteredPhase>,
        prompt: &dyn OperatorPrompt,
    ) -> Result<RunOutcome> {
        self.state = running;
        let total = phases.len();
        let mut ledger = PhaseLedger::load(&self.settings.ledger_path());
        info!("Executing {} phases", total);

        for (index, registered) in phases.iter().enumerate() {
            if self.interrupted.load(Ordering::SeqCst) {
                self.state = InstallerState::Halted;
                warn!(
                    target: AUDIT_TARGET,
                    "INTERRUPTED before phase={} session={}",
                    registered.name(),
                    self.session_id
                );
                return Err(InstallerError::cancelled(format!(
                    "Interrupted before phase '{}'",
                    registered.name()
                )));
            }

            let ctx = self.context(config, index + 1, total);
            let result = self.executor.execute(registered, &ctx).await;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    self.state = InstallerState::Halted;
                    return Err(e);
                }
            };
            self.records.push(record.clone());

            if let Err(e) = record.clone().into_result() {
                self.state = InstallerState::Halted;
                error!(
                    target: AUDIT_TARGET,
                    "HALTED at phase={} session={}",
                    registered.name(),
                    self.session_id
                );
                return Err(e);
            }

            ledger.record(registered.name(), self.session_id, config.role);
            self.save_ledger(&ledger);

            let next = phases.get(index + 1);
            if let Some(next) = next {
                if registered.phase.category() != PhaseCategory::Verification
                    && prompt.pause_after(&record, next.phase.label())
                {
                    self.state = InstallerState::Halted;
                    info!(
                        target: AUDIT_TARGET,
                        "PAUSED after phase={} session={}",
                        registered.name(),
                        self.session_id
                    );
                    return Ok(RunOutcome::Paused {
                        after: registered.name().to_string(),
                    });
                }
            }
        }

        self.state = InstallerState::Complete;
        info!(target: AUDIT_TARGET, "COMPLETE session={}", self.session_id);
        Ok(RunOutcome::Completed)
    }
}
