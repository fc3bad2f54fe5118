// file: src/logging/mod.rs
// version: 2.0.0
// guid: 29ccb056-f809-4f71-a784-634fcf2c393f

//! Logging system for the cloud node installer
//!
//! One master log per invocation (via `tracing`), one append-only log per
//! phase, and a reports directory for verification artifacts.

pub mod layout;
pub mod logger;
pub mod phase_log;

pub use layout::LogLayout;
pub use logger::{init_logger, AUDIT_TARGET};
pub use phase_log::PhaseLog;
