// file: src/host/mod.rs
// version: 1.0.0
// guid: 7ed63ab2-2e63-4925-a689-5f53234d9ee4

//! Access to the machine being provisioned
//!
//! Phase actions mutate the host through a [`CommandRunner`]; post-condition
//! probes and verification checks only read it through a [`HostProbe`].

pub mod probe;
pub mod runner;

pub use probe::{HostProbe, LiveHost, LogCounts, ProbeOutcome, SystemSnapshot};
pub use runner::{CommandOutput, CommandRunner, DryRunRunner, LocalRunner};
