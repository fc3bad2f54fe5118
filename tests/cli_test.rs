// file: tests/cli_test.rs
// version: 1.0.0
// guid: 1e54a196-b25a-44cb-99ee-4e47948d948f

//! Binary-level tests of the read-only commands and configuration errors

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cloud_install() -> Command {
    let mut cmd = Command::cargo_bin("cloud-install").unwrap();
    cmd.env_remove("CLOUD_INSTALL_CONFIG_DIR")
        .env_remove("CLOUD_INSTALL_LOG_DIR");
    cmd
}

#[test]
fn test_phases_for_compute_role() {
    cloud_install()
        .args(["phases", "--role", "compute"])
        .assert()
        .success()
        .stdout(predicate::str::contains("virtualization"))
        .stdout(predicate::str::contains("control_plane").not());
}

#[test]
fn test_phases_table_lists_every_phase() {
    cloud_install()
        .arg("phases")
        .assert()
        .success()
        .stdout(predicate::str::contains("storage_backend"))
        .stdout(predicate::str::contains("verification"));
}

#[test]
fn test_show_config_without_saved_config() {
    let dir = TempDir::new().unwrap();

    cloud_install()
        .args(["show-config", "--config-dir"])
        .arg(dir.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No node configuration found"));
}

#[test]
fn test_continue_without_saved_config() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("installer.toml");
    std::fs::write(
        &settings,
        format!(
            "config_dir = {:?}\nlog_dir = {:?}\nrequire_root = false\n",
            dir.path().join("etc"),
            dir.path().join("log")
        ),
    )
    .unwrap();

    // Act / Assert
    cloud_install()
        .args(["continue", "--settings"])
        .arg(&settings)
        .assert()
        .code(3);
}

#[test]
fn test_install_rejects_bad_address() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("installer.toml");
    std::fs::write(
        &settings,
        format!(
            "config_dir = {:?}\nlog_dir = {:?}\nrequire_root = false\n",
            dir.path().join("etc"),
            dir.path().join("log")
        ),
    )
    .unwrap();

    cloud_install()
        .args(["--dry-run", "install", "--role", "controller", "--management-ip", "10.0.0.300"])
        .args(["--interface", "eth0", "--hostname", "ctl-1", "--settings"])
        .arg(&settings)
        .assert()
        .code(3);
}

#[test]
fn test_dry_run_install_persists_nothing() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("installer.toml");
    std::fs::write(
        &settings,
        format!(
            "config_dir = {:?}\nlog_dir = {:?}\nrequire_root = false\n",
            dir.path().join("etc"),
            dir.path().join("log")
        ),
    )
    .unwrap();

    // Act
    cloud_install()
        .args(["--dry-run", "install", "--role", "controller", "--management-ip", "10.0.0.10"])
        .args(["--interface", "eth0", "--hostname", "ctl-1", "--settings"])
        .arg(&settings)
        .assert();

    // Assert
    assert!(!dir.path().join("etc").join("node.json").exists());
    assert!(!dir.path().join("etc").join("phase-ledger.json").exists());
}

#[test]
fn test_install_rejects_hostname_with_shell_quotes() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("installer.toml");
    std::fs::write(
        &settings,
        format!(
            "config_dir = {:?}\nlog_dir = {:?}\nrequire_root = false\n",
            dir.path().join("etc"),
            dir.path().join("log")
        ),
    )
    .unwrap();

    cloud_install()
        .args(["--dry-run", "install", "--role", "controller", "--management-ip", "10.0.0.10"])
        .args(["--interface", "eth0", "--hostname", "ctl'; touch /tmp/x; echo '", "--settings"])
        .arg(&settings)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid hostname"));
}
