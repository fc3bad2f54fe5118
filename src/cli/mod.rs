// file: src/cli/mod.rs
// version: 2.0.0
// guid: 4168aed5-d199-4c7d-adf3-fd0011ec99ad

//! Command line interface for the cloud node installer

pub mod args;
pub mod commands;
pub mod menu;

pub use args::Cli;
pub use commands::*;
