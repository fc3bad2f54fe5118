// file: src/utils/system.rs
// version: 2.0.0
// guid: 6bf40ced-5575-48c6-9d65-2cbace4aea55

//! System utility functions

use std::fs;
use sysinfo::System;

/// Release file inspected by the OS check
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// System utility functions
pub struct SystemUtils;

impl SystemUtils {
    /// Check if running as root
    pub fn is_root() -> bool {
        #[cfg(unix)]
        {
            unsafe { libc::geteuid() == 0 }
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Machine hostname, or "localhost" if it cannot be determined
    pub fn hostname() -> String {
        System::host_name()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// Distribution id and version from the os-release file
    pub fn os_release() -> Option<OsRelease> {
        fs::read_to_string(OS_RELEASE_PATH)
            .ok()
            .map(|content| OsRelease::parse(&content))
    }

    /// True if the CPU advertises hardware virtualization (vmx/svm)
    pub fn cpu_virtualization_flags(cpuinfo: &str) -> bool {
        cpuinfo
            .lines()
            .filter(|line| line.starts_with("flags"))
            .any(|line| line.split_whitespace().any(|flag| flag == "vmx" || flag == "svm"))
    }
}

/// Fields of interest from `/etc/os-release`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub version_id: String,
    pub pretty_name: String,
}

impl OsRelease {
    pub fn parse(content: &str) -> Self {
        let mut release = OsRelease::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "ID" => release.id = value,
                "VERSION_ID" => release.version_id = value,
                "PRETTY_NAME" => release.pretty_name = value,
                _ => {}
            }
        }
        release
    }

    /// Ubuntu is the only supported distribution
    pub fn is_supported(&self) -> bool {
        self.id == "ubuntu"
    }
}
