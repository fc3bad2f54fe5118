// file: src/error.rs
// version: 1.0.0
// guid: 2a6f9f80-0d08-4170-a566-138fdea37f67

//! Error types shared by every layer of the installer

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for the installer
pub type Result<T> = std::result::Result<T, InstallerError>;

/// Error kinds surfaced to the operator
#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("No node configuration found at {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Node configuration at {} is corrupt: {reason}", path.display())]
    ConfigCorrupt { path: PathBuf, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network interface detection failed: {0}")]
    InterfaceDetectionFailed(String),

    #[error("Phase '{phase}' failed, see {}", log.display())]
    PhaseActionFailed { phase: String, log: PathBuf },

    #[error("Probe '{probe}' timed out after {timeout:?}")]
    ProbeTimeout { probe: String, timeout: Duration },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Command execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl InstallerError {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a new permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create a new interface detection error
    pub fn interface_detection(msg: impl Into<String>) -> Self {
        Self::InterfaceDetectionFailed(msg.into())
    }

    /// Create a new cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a new probe timeout error
    pub fn probe_timeout(probe: impl Into<String>, timeout: Duration) -> Self {
        Self::ProbeTimeout {
            probe: probe.into(),
            timeout,
        }
    }

    /// Process exit code for this error kind
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled(_) => 130,
            Self::PermissionDenied(_) => 4,
            Self::ConfigNotFound(_)
            | Self::ConfigCorrupt { .. }
            | Self::Validation(_)
            | Self::InterfaceDetectionFailed(_)
            | Self::Config(_)
            | Self::Yaml(_)
            | Self::Toml(_) => 3,
            _ => 1,
        }
    }

    /// True for errors raised before any system mutation took place
    pub fn is_configuration_error(&self) -> bool {
        self.exit_code() == 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_failure_points_at_log() {
        let err = InstallerError::PhaseActionFailed {
            phase: "network".to_string(),
            log: PathBuf::from("/var/log/cloud-provider/phases/network.log"),
        };

        let message = err.to_string();
        assert!(message.contains("network"));
        assert!(message.contains("/var/log/cloud-provider/phases/network.log"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_codes_by_kind() {
        assert_eq!(InstallerError::cancelled("ctrl-c").exit_code(), 130);
        assert_eq!(InstallerError::permission("not root").exit_code(), 4);
        assert_eq!(InstallerError::validation("bad ip").exit_code(), 3);
        assert_eq!(
            InstallerError::ConfigNotFound(PathBuf::from("/etc/cloud-provider/node.json")).exit_code(),
            3
        );
        assert!(InstallerError::config("missing").is_configuration_error());
        assert!(!InstallerError::execution("boom").is_configuration_error());
    }
}
