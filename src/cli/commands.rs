// file: src/cli/commands.rs
// version: 2.0.0
// guid: 9f1f2894-139d-4e71-81d9-0a517de5ff79

//! Command implementations for the CLI
//!
//! Every command returns the process exit code on success; errors carry
//! their own code through [`InstallerError::exit_code`].

use super::args::{NodeArgs, ScopeArg};
use super::menu::{self, InteractivePause, MenuChoice, TerminalPrompter};
use crate::config::{collect_interactive, ConfigStore, InstallerSettings, NodeConfig, NodeConfigBuilder, NodeRole};
use crate::host::{CommandRunner, DryRunRunner, LiveHost, LocalRunner};
use crate::installer::{Installer, NeverPause, OperatorPrompt, ReconfigureScope, RunOutcome, VerificationRun};
use crate::logging::LogLayout;
use crate::phases::control_plane::{NB_PORT, SB_PORT};
use crate::phases::PhaseRegistry;
use crate::utils::NetworkUtils;
use crate::{InstallerError, Result};
use colored::Colorize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

/// Exit code of a verification that found failures
pub const VERIFY_FAILED_EXIT: i32 = 2;

/// Everything a command needs from the process environment
pub struct AppContext {
    pub settings: InstallerSettings,
    pub layout: LogLayout,
    pub interactive: bool,
    pub interrupted: Arc<AtomicBool>,
    dry_run: Option<Arc<DryRunRunner>>,
}

impl AppContext {
    pub fn new(
        settings: InstallerSettings,
        layout: LogLayout,
        interactive: bool,
        dry_run: bool,
        interrupted: Arc<AtomicBool>,
    ) -> Self {
        Self {
            settings,
            layout,
            interactive,
            interrupted,
            dry_run: dry_run.then(|| Arc::new(DryRunRunner::new())),
        }
    }

    /// Installer wired to the live host; in a dry run phase actions are only recorded
    pub fn installer(&self) -> Installer {
        let live: Arc<dyn CommandRunner> = Arc::new(LocalRunner::new());
        let runner: Arc<dyn CommandRunner> = match &self.dry_run {
            Some(recorder) => recorder.clone() as Arc<dyn CommandRunner>,
            None => live.clone(),
        };
        let host = Arc::new(LiveHost::new(live, self.settings.probe_timeout()));

        Installer::new(self.settings.clone(), self.layout.clone(), runner, host)
            .with_progress(self.interactive)
            .with_interrupt_flag(self.interrupted.clone())
            .with_dry_run(self.dry_run.is_some())
    }

    fn operator_prompt(&self) -> Box<dyn OperatorPrompt> {
        if self.interactive {
            Box::new(InteractivePause)
        } else {
            Box::new(NeverPause)
        }
    }

    fn report_dry_run(&self) {
        if let Some(recorder) = &self.dry_run {
            let commands = recorder.commands();
            println!("\n{} {} commands recorded:", "DRY RUN:".yellow().bold(), commands.len());
            for command in commands {
                println!("  $ {}", command);
            }
        }
    }
}

/// Show the main menu and dispatch the choice
pub async fn menu_command(app: &AppContext) -> Result<i32> {
    let has_config = ConfigStore::new(app.settings.node_config_path()).exists();
    let choice = {
        let mut prompter = TerminalPrompter::stdio();
        menu::main_menu(&mut prompter, has_config)?
    };

    match choice {
        MenuChoice::FreshInstall => install_command(app, &NodeArgs::default()).await,
        MenuChoice::Continue => continue_command(app).await,
        MenuChoice::Reconfigure => reconfigure_command(app, None, &NodeArgs::default()).await,
        MenuChoice::Verify => verify_command(app).await,
        MenuChoice::Exit => Ok(0),
    }
}

/// Fresh installation from flags, a file, the interactive flow or (without a
/// terminal) the saved configuration
pub async fn install_command(app: &AppContext, node: &NodeArgs) -> Result<i32> {
    let mut installer = app.installer();

    let config = if !node.is_empty() {
        build_with_interface(node.to_builder()?)?
    } else if app.interactive {
        let existing = installer.store().load().ok();
        let detected = NetworkUtils::detect_interface()
            .map_err(|e| warn!("{}", e))
            .ok();
        let mut prompter = TerminalPrompter::stdio();
        collect_interactive(&mut prompter, detected.as_deref(), existing.as_ref())?
    } else {
        info!("No terminal attached; installing from the saved configuration");
        installer.load_config()?
    };

    let prompt = app.operator_prompt();
    let result = installer.fresh_install(config.clone(), prompt.as_ref()).await;
    app.report_dry_run();
    finish_run(app, &config, result?)
}

/// Resume the pipeline for the saved configuration
pub async fn continue_command(app: &AppContext) -> Result<i32> {
    let mut installer = app.installer();
    let config = installer.load_config()?;

    let prompt = app.operator_prompt();
    let result = installer.continue_install(prompt.as_ref()).await;
    app.report_dry_run();
    finish_run(app, &config, result?)
}

/// Apply a new configuration and re-run the selected scope
pub async fn reconfigure_command(app: &AppContext, scope: Option<ScopeArg>, node: &NodeArgs) -> Result<i32> {
    let mut installer = app.installer();
    let existing = installer.load_config()?;

    let (config, scope) = if !node.is_empty() {
        let builder = NodeConfigBuilder::from(&existing).merge(node.to_builder()?);
        let scope = match scope {
            Some(scope) => scope.into(),
            None if app.interactive => menu::choose_scope(&mut TerminalPrompter::stdio())?,
            None => return Err(InstallerError::validation("--scope is required without a terminal")),
        };
        (builder.build()?, scope)
    } else if app.interactive {
        let mut prompter = TerminalPrompter::stdio();
        let scope = match scope {
            Some(scope) => scope.into(),
            None => menu::choose_scope(&mut prompter)?,
        };
        let detected = Some(existing.physical_interface.as_str());
        (collect_interactive(&mut prompter, detected, Some(&existing))?, scope)
    } else {
        return Err(InstallerError::validation(
            "Reconfigure without a terminal needs --config or node flags",
        ));
    };

    info!("Reconfiguring: {}", scope.description());
    let prompt = app.operator_prompt();
    let result = installer.reconfigure(config.clone(), scope, prompt.as_ref()).await;
    app.report_dry_run();
    let outcome = result?;

    if scope == ReconfigureScope::NetworkOnly {
        if let RunOutcome::Completed = outcome {
            println!("{}", "Network reconfigured.".green().bold());
            return Ok(0);
        }
    }
    finish_run(app, &config, outcome)
}

/// Run the verification checks and print the report
pub async fn verify_command(app: &AppContext) -> Result<i32> {
    let mut installer = app.installer();
    let run = installer.verify_only().await?;
    Ok(print_verification(&run))
}

/// List the phases in pipeline order, optionally for one role
pub fn phases_command(role: Option<NodeRole>) -> Result<()> {
    let registry = PhaseRegistry::standard();

    match role {
        Some(role) => {
            println!("Phases for a {} node:", role);
            for (step, registered) in registry.for_role(role).iter().enumerate() {
                println!("  {}. {:<16} {}", step + 1, registered.name(), registered.phase.label());
            }
        }
        None => {
            println!("{:<4} {:<16} {:<40} ROLES", "#", "PHASE", "DESCRIPTION");
            for registered in registry.all() {
                let roles: Vec<&str> = registered.phase.roles().iter().map(|r| r.as_str()).collect();
                println!(
                    "{:<4} {:<16} {:<40} {}",
                    registered.ordinal,
                    registered.name(),
                    registered.phase.label(),
                    roles.join(",")
                );
            }
        }
    }
    Ok(())
}

/// Print the saved node configuration
pub fn show_config_command(settings: &InstallerSettings, json: bool) -> Result<()> {
    let config = ConfigStore::new(settings.node_config_path()).load()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("Node configuration ({}):", settings.node_config_path().display());
        print!("{}", config.render_summary());
    }
    Ok(())
}

/// Fill in the physical interface by detection when none was supplied
fn build_with_interface(builder: NodeConfigBuilder) -> Result<NodeConfig> {
    if builder.physical_interface.is_some() {
        return builder.build();
    }
    let interface = NetworkUtils::detect_interface()?;
    info!("Detected physical interface {}", interface);
    builder.physical_interface(interface).build()
}

fn finish_run(app: &AppContext, config: &NodeConfig, outcome: RunOutcome) -> Result<i32> {
    match outcome {
        RunOutcome::Completed => {
            print_completion_banner(app, config);
            Ok(0)
        }
        RunOutcome::Paused { after } => {
            println!(
                "{} after '{}'. Run `cloud-install continue` to resume.",
                "Paused".yellow().bold(),
                after
            );
            Ok(0)
        }
        RunOutcome::Verified(run) => {
            println!("Nothing left to do; verifying the installation.");
            Ok(print_verification(&run))
        }
    }
}

fn print_verification(run: &VerificationRun) -> i32 {
    println!("{}", run.report.render_text());
    if let Some(path) = &run.artifact {
        println!("Report saved to {}", path.display());
    }
    if run.report.passed() {
        println!("{}", "Verification PASSED".green().bold());
        0
    } else {
        println!("{}", "Verification FAILED".red().bold());
        VERIFY_FAILED_EXIT
    }
}

/// Lines of the completion banner after a successful pipeline
pub fn completion_lines(config: &NodeConfig, settings: &InstallerSettings) -> Vec<String> {
    let mut lines = vec![format!("{} node {} is ready", config.role, config.hostname)];

    if config.role.runs_control_plane() {
        let address = config.management_address;
        lines.push(format!("Control plane API:  http://{}:{}", address, settings.api_port));
        lines.push(format!("OVN Northbound DB:  tcp:{}:{}", address, NB_PORT));
        lines.push(format!("OVN Southbound DB:  tcp:{}:{}", address, SB_PORT));
    } else {
        lines.push(format!("Controller:         {}", config.controller_address));
    }
    if config.role.runs_virtualization() {
        lines.push(format!("Overlay tunnel IP:  {}", config.internal_address));
    }
    if let Some(storage) = &config.storage {
        lines.push(format!("Ceph OSD disks:     {}", storage.disks.join(", ")));
    }
    lines
}

fn print_completion_banner(app: &AppContext, config: &NodeConfig) {
    let rule = "=".repeat(60);
    println!("\n{}", rule.green());
    println!("{}", "INSTALLATION COMPLETE".green().bold());
    println!("{}", rule.green());
    for line in completion_lines(config, &app.settings) {
        println!("  {}", line);
    }
    println!("  Logs:               {}", app.layout.root().display());
    println!("{}\n", rule.green());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_banner_lists_access_urls() {
        // Arrange
        let config = NodeConfig::builder()
            .role(NodeRole::Controller)
            .hostname("ctl-1")
            .management_address("10.0.0.10")
            .physical_interface("eth0")
            .build()
            .unwrap();

        // Act
        let lines = completion_lines(&config, &InstallerSettings::default());

        // Assert
        assert!(lines.iter().any(|l| l.contains("http://10.0.0.10:8000")));
        assert!(lines.iter().any(|l| l.contains("tcp:10.0.0.10:6641")));
        assert!(!lines.iter().any(|l| l.starts_with("Controller:")));
    }

    #[test]
    fn test_compute_banner_names_controller() {
        let config = NodeConfig::builder()
            .role(NodeRole::Compute)
            .hostname("cmp-1")
            .management_address("10.0.0.11")
            .controller_address("10.0.0.10")
            .physical_interface("eth0")
            .build()
            .unwrap();

        let lines = completion_lines(&config, &InstallerSettings::default());

        assert!(lines.iter().any(|l| l.contains("Controller:") && l.contains("10.0.0.10")));
        assert!(lines.iter().any(|l| l.contains("10.0.1.11")));
        assert!(!lines.iter().any(|l| l.contains("http://")));
    }

    #[test]
    fn test_build_with_interface_keeps_supplied_name() {
        let builder = NodeConfig::builder()
            .role(NodeRole::Controller)
            .hostname("ctl-1")
            .management_address("10.0.0.10")
            .physical_interface("enp3s0");

        let config = build_with_interface(builder).unwrap();

        assert_eq!(config.physical_interface, "enp3s0");
    }
}
