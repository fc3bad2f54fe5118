// file: src/installer/ledger.rs
// version: 1.0.0
// guid: c99b48ba-0139-4d88-9084-ce815ab7df0f

//! Phase-completion ledger
//!
//! Records which phases finished, when and in which session. Pending work is
//! still decided by live probes; the ledger explains the difference between
//! what was recorded and what the host currently shows.

use crate::config::store::write_atomic;
use crate::config::NodeRole;
use crate::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub completed_at: DateTime<Local>,
    pub session: Uuid,
    pub role: NodeRole,
}

/// Completed phases keyed by phase name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseLedger {
    #[serde(default)]
    entries: BTreeMap<String, LedgerEntry>,
}

impl PhaseLedger {
    /// Load the ledger; a missing or unreadable ledger starts empty
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring unreadable phase ledger {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!("Could not read phase ledger {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }

    pub fn record(&mut self, phase: &str, session: Uuid, role: NodeRole) {
        self.entries.insert(
            phase.to_string(),
            LedgerEntry {
                completed_at: Local::now(),
                session,
                role,
            },
        );
    }

    pub fn forget(&mut self, phase: &str) {
        self.entries.remove(phase);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, phase: &str) -> Option<&LedgerEntry> {
        self.entries.get(phase)
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.entries.contains_key(phase)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_forget() -> Result<()> {
        // Arrange
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("phase-ledger.json");
        let session = Uuid::new_v4();
        let mut ledger = PhaseLedger::default();
        ledger.record("network", session, NodeRole::Compute);
        ledger.record("system_prep", session, NodeRole::Compute);

        // Act
        ledger.save(&path)?;
        let mut loaded = PhaseLedger::load(&path);
        loaded.forget("network");

        // Assert
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("system_prep"));
        assert_eq!(loaded.get("system_prep").map(|e| e.session), Some(session));
        Ok(())
    }

    #[test]
    fn test_missing_or_garbage_ledger_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("phase-ledger.json");
        assert!(PhaseLedger::load(&path).is_empty());

        fs::write(&path, "{not json")?;
        assert!(PhaseLedger::load(&path).is_empty());
        Ok(())
    }
}
