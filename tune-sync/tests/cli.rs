//! Integration tests for the tune-sync binary
//!
//! The configured backend points at a closed port, so only paths that stay
//! local (or fail before reaching the network) are exercised here.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Helper to create a config file whose data directory lives in the tempdir
fn setup_test_env() -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let config_path = temp_dir.path().join("config.toml");

    let config_content = format!(
        r#"
[api]
base_url = "http://127.0.0.1:9/v1"
timeout_secs = 2

[socket]
url = "ws://127.0.0.1:9"

[storage]
data_dir = "{data}"
kv_path = "{data}/kv.db"
"#,
        data = escape_path_for_toml(&data_dir.to_string_lossy())
    );
    fs::write(&config_path, config_content).unwrap();

    (temp_dir, config_path.to_string_lossy().to_string())
}

fn tune_sync(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("tune-sync").unwrap();
    cmd.env_remove("TUNECAST_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_path);
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("tune-sync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("listen"))
        .stdout(predicate::str::contains("forgot-password"))
        .stdout(predicate::str::contains("reset-password"));
}

#[test]
fn test_init_creates_media_folders() {
    let (temp_dir, config_path) = setup_test_env();

    tune_sync(&config_path)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("avatars"));

    let data_dir = temp_dir.path().join("data");
    for name in ["posts/sounds", "posts/thumbnails", "posts/avatars", "users/avatars"] {
        assert!(data_dir.join(name).is_dir(), "{name} missing");
    }
    assert!(data_dir.join("kv.db").exists());
}

#[test]
fn test_missing_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    tune_sync(&missing.to_string_lossy())
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_forgot_password_rejects_bad_email() {
    let (_temp_dir, config_path) = setup_test_env();

    tune_sync(&config_path)
        .args(["forgot-password", "not-an-email"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Email is not valid"));
}

#[test]
fn test_forgot_password_unreachable_backend() {
    let (_temp_dir, config_path) = setup_test_env();

    tune_sync(&config_path)
        .args(["forgot-password", "amy@example.com"])
        .assert()
        .code(1);
}

#[test]
fn test_reset_password_without_recovery() {
    let (_temp_dir, config_path) = setup_test_env();

    tune_sync(&config_path)
        .args(["reset-password", "--stdin"])
        .write_stdin("newpass123\n")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no password recovery in progress"));
}

#[test]
fn test_reset_password_weak_password() {
    let (_temp_dir, config_path) = setup_test_env();

    tune_sync(&config_path)
        .args(["reset-password", "--stdin"])
        .write_stdin("short\n")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("at least 8 characters"));
}

#[test]
fn test_reset_password_needs_tty_or_stdin() {
    let (_temp_dir, config_path) = setup_test_env();

    tune_sync(&config_path)
        .arg("reset-password")
        .write_stdin("newpass123\n")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--stdin"));
}

#[test]
fn test_listen_requires_user() {
    let (_temp_dir, config_path) = setup_test_env();

    tune_sync(&config_path)
        .arg("listen")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_listen_unreachable_socket() {
    let (_temp_dir, config_path) = setup_test_env();

    tune_sync(&config_path)
        .args(["listen", "--user", "amy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Connection failed"));
}
