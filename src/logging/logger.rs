// file: src/logging/logger.rs
// version: 2.0.0
// guid: b08643af-d7d2-4be1-b8dd-71c44238bd3b

//! Logger initialization and configuration

use crate::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Target used for phase start/end lines in the master log
pub const AUDIT_TARGET: &str = "audit";

fn level_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Filter for the master log: the console level, but audit lines always pass
fn master_log_filter(verbose: bool) -> EnvFilter {
    let filter = level_filter(verbose, false);
    match format!("{}=info", AUDIT_TARGET).parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Initialize the logging system.
///
/// When `master_log` is given, every event at info level or above (debug with
/// `verbose`) is also appended to that file without ANSI colors, regardless of
/// `quiet`. Phase start/end lines reach the file even when `RUST_LOG` asks
/// for a higher level.
pub fn init_logger(verbose: bool, quiet: bool, master_log: Option<&Path>) -> Result<()> {
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(level_filter(verbose, quiet));

    let file_layer = match master_log {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(master_log_filter(verbose)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::error::InstallerError::config(format!("Failed to initialize logger: {}", e)))?;

    if let Some(path) = master_log {
        tracing::info!(target: AUDIT_TARGET, "Logging to {}", path.display());
    }

    Ok(())
}
