// file: src/main.rs
// version: 2.0.0
// guid: 25e769a9-b15b-4b45-a098-3017284ecc8f

//! Cloud node installer - main entry point

use chrono::Local;
use clap::Parser;
use cloud_node_installer::{
    cli::{args::Commands, commands::*, Cli},
    config::InstallerSettings,
    logging::{init_logger, LogLayout},
    utils::SystemUtils,
    InstallerError, Result,
};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::warn;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code().clamp(0, 255) as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let mut settings = InstallerSettings::resolve(cli.settings.as_deref(), cli.config_dir.as_deref())?;
    if let Some(dir) = &cli.config_dir {
        settings.config_dir = dir.clone();
    }
    if let Some(dir) = &cli.log_dir {
        settings.log_dir = dir.clone();
    }

    // Read-only commands need neither root nor a log directory
    match &cli.command {
        Some(Commands::Phases { role }) => {
            init_logger(cli.verbose, cli.quiet, None)?;
            phases_command(role.clone().map(Into::into))?;
            return Ok(0);
        }
        Some(Commands::ShowConfig { json }) => {
            init_logger(cli.verbose, cli.quiet, None)?;
            show_config_command(&settings, *json)?;
            return Ok(0);
        }
        _ => {}
    }

    if settings.require_root && !SystemUtils::is_root() {
        return Err(InstallerError::permission(
            "cloud-install must be run as root (try sudo)",
        ));
    }

    let layout = LogLayout::new(&settings.log_dir, Local::now());
    layout.ensure()?;
    init_logger(cli.verbose, cli.quiet, Some(layout.master_log().as_path()))?;

    let interactive = std::io::stdin().is_terminal();
    let interrupted = Arc::new(AtomicBool::new(false));
    watch_interrupts(interrupted.clone());

    let app = AppContext::new(settings, layout, interactive, cli.dry_run, interrupted);

    match cli.command {
        Some(Commands::Install { node }) => install_command(&app, &node).await,
        Some(Commands::Continue) => continue_command(&app).await,
        Some(Commands::Reconfigure { scope, node }) => reconfigure_command(&app, scope, &node).await,
        Some(Commands::Verify) => verify_command(&app).await,
        Some(Commands::Phases { .. }) | Some(Commands::ShowConfig { .. }) => Ok(0),
        None if interactive => menu_command(&app).await,
        None => install_command(&app, &Default::default()).await,
    }
}

/// First Ctrl-C lets the running phase finish and stops the pipeline before
/// the next one; a second Ctrl-C exits immediately.
fn watch_interrupts(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_err() {
            warn!("Could not install Ctrl+C handler");
            return;
        }
        flag.store(true, Ordering::SeqCst);
        warn!("Received Ctrl+C, stopping after the current phase (press again to abort)");

        if signal::ctrl_c().await.is_ok() {
            warn!("Application interrupted by user");
            std::process::exit(130);
        }
    });
}
