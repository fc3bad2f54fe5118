// file: src/config/store.rs
// version: 1.0.0
// guid: 561b64fe-be2c-4da3-9c48-c9b0bdf1ffc8

//! Durable storage of the node configuration

use super::NodeConfig;
use crate::{InstallerError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Owner read/write only
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Persists the node configuration as JSON with atomic replacement
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store backed by the given file
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the persisted configuration.
    ///
    /// A missing file is `ConfigNotFound`; anything that fails to decode or
    /// validate is `ConfigCorrupt`. No partially decoded value is returned.
    pub fn load(&self) -> Result<NodeConfig> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(InstallerError::ConfigNotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let config: NodeConfig = serde_json::from_str(&content).map_err(|e| InstallerError::ConfigCorrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        config.validate().map_err(|e| InstallerError::ConfigCorrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        debug!("Loaded node configuration from {}", self.path.display());
        Ok(config)
    }

    /// Validate and atomically persist the configuration with mode 0600
    pub fn save(&self, config: &NodeConfig) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, json.as_bytes())?;
        info!("Configuration saved to {}", self.path.display());
        Ok(())
    }

    /// Copy the current configuration to a timestamped sibling and return its path.
    ///
    /// Existing backups are never overwritten; a numeric suffix is appended when
    /// two backups land on the same timestamp.
    pub fn backup(&self) -> Result<PathBuf> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(InstallerError::ConfigNotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.6f").to_string();
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "node.json".to_string());

        for attempt in 0u32.. {
            let candidate = if attempt == 0 {
                self.path.with_file_name(format!("{}.backup-{}", file_name, stamp))
            } else {
                self.path
                    .with_file_name(format!("{}.backup-{}-{}", file_name, stamp, attempt))
            };

            match create_private(&candidate) {
                Ok(mut file) => {
                    file.write_all(&content)?;
                    file.sync_all()?;
                    info!("Configuration backed up to {}", candidate.display());
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(InstallerError::execution(format!(
            "No free backup name next to {}",
            self.path.display()
        )))
    }

    /// Backups of this configuration, oldest first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let Some(dir) = self.path.parent() else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let prefix = format!(
            "{}.backup-",
            self.path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
        );

        let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect();
        backups.sort();
        Ok(backups)
    }
}

/// Write `content` to `path` through a temp file in the same directory and rename it into place
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(dir)?;
    set_private(tmp.path())?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| InstallerError::Io(e.error))?;
    Ok(())
}

fn create_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_FILE_MODE);
    }
    options.open(path)
}

fn set_private(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(PRIVATE_FILE_MODE))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeRole;
    use tempfile::TempDir;

    fn sample() -> NodeConfig {
        NodeConfig::builder()
            .role(NodeRole::Storage)
            .hostname("stor-01")
            .management_address("10.0.0.21")
            .controller_address("10.0.0.10")
            .physical_interface("eno1")
            .storage_disks(vec!["sdb".to_string(), "sdc".to_string()])
            .build()
            .unwrap()
    }

    #[test]
    fn test_save_then_load_round_trips() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("etc/node.json"));
        let config = sample();

        // Act
        store.save(&config).unwrap();
        let loaded = store.load().unwrap();

        // Assert
        assert_eq!(loaded, config);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("node.json"));
        store.save(&sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("node.json"));
        assert!(matches!(store.load(), Err(InstallerError::ConfigNotFound(_))));
        assert!(matches!(store.backup(), Err(InstallerError::ConfigNotFound(_))));
    }

    #[test]
    fn test_corrupt_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("node.json");
        fs::write(&path, "{\"role\": \"compute\", \"management_address\": ").unwrap();

        let store = ConfigStore::new(&path);
        assert!(matches!(store.load(), Err(InstallerError::ConfigCorrupt { .. })));
    }

    #[test]
    fn test_semantically_invalid_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("node.json"));
        let mut config = sample();
        store.save(&config).unwrap();

        config.internal_address = "10.0.1.99".parse().unwrap();
        fs::write(store.path(), serde_json::to_string(&config).unwrap()).unwrap();

        assert!(matches!(store.load(), Err(InstallerError::ConfigCorrupt { .. })));
    }

    #[test]
    fn test_save_replaces_without_leaving_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("node.json"));
        store.save(&sample()).unwrap();
        let mut changed = sample();
        changed.hostname = "stor-02".to_string();
        store.save(&changed).unwrap();

        assert_eq!(store.load().unwrap().hostname, "stor-02");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_backups_never_collide() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("node.json"));
        store.save(&sample()).unwrap();

        let first = store.backup().unwrap();
        let second = store.backup().unwrap();
        let third = store.backup().unwrap();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(store.list_backups().unwrap().len(), 3);
        assert_eq!(fs::read(&first).unwrap(), fs::read(store.path()).unwrap());
    }
}
