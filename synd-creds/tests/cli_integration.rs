//! CLI integration tests for synd-creds

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const API_KEY: &str = "devto-secret-api-key";

fn setup_test_env() -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("creds.db");

    fs::write(
        &config_path,
        format!(
            "[database]\npath = \"{}\"\n",
            db_path.to_string_lossy().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    (temp_dir, config_path.to_string_lossy().to_string())
}

fn synd_creds(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("synd-creds").unwrap();
    cmd.env("SYNDICATE_CONFIG", config_path)
        .env("SYNDICATE_ENCRYPTION_KEY", "creds-cli-test-key")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_set_and_list_never_show_key() {
    let (_temp_dir, config_path) = setup_test_env();

    synd_creds(&config_path)
        .args(["set", "devto", "--stdin"])
        .write_stdin(API_KEY)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored DEV.to credentials"))
        .stdout(predicate::str::contains(API_KEY).not());

    synd_creds(&config_path)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DEV.to"))
        .stdout(predicate::str::contains("active"))
        .stdout(predicate::str::contains(API_KEY).not());

    let output = synd_creds(&config_path)
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["platform"], "devto");
    assert_eq!(listed[0]["isActive"], true);
    assert!(!String::from_utf8_lossy(&output.stdout).contains(API_KEY));
}

#[test]
fn test_wordpress_requires_site_url() {
    let (_temp_dir, config_path) = setup_test_env();

    synd_creds(&config_path)
        .args(["set", "wordpress", "--stdin"])
        .write_stdin("wp-app-password")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("WordPress requires a site URL"));

    synd_creds(&config_path)
        .args(["set", "wp", "--stdin", "--site-url", "https://blog.example.com/"])
        .write_stdin("wp-app-password")
        .assert()
        .success()
        .stdout(predicate::str::contains("site: https://blog.example.com"));
}

#[test]
fn test_disable_and_enable() {
    let (_temp_dir, config_path) = setup_test_env();

    synd_creds(&config_path)
        .args(["set", "medium", "--stdin"])
        .write_stdin("medium-token")
        .assert()
        .success();

    synd_creds(&config_path)
        .args(["disable", "medium"])
        .assert()
        .success();
    synd_creds(&config_path)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));

    synd_creds(&config_path)
        .args(["enable", "medium"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Medium enabled"));
}

#[test]
fn test_delete_missing_is_not_found() {
    let (_temp_dir, config_path) = setup_test_env();

    synd_creds(&config_path)
        .args(["delete", "medium", "--force"])
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_delete_existing() {
    let (_temp_dir, config_path) = setup_test_env();

    synd_creds(&config_path)
        .args(["set", "devto", "--stdin"])
        .write_stdin(API_KEY)
        .assert()
        .success();

    synd_creds(&config_path)
        .args(["delete", "devto", "--force"])
        .assert()
        .success();

    synd_creds(&config_path)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No credentials stored"));
}

#[test]
fn test_delete_with_short_force_flag() {
    let (_temp_dir, config_path) = setup_test_env();

    synd_creds(&config_path)
        .args(["set", "medium", "--stdin"])
        .write_stdin("medium-token")
        .assert()
        .success();

    synd_creds(&config_path)
        .args(["delete", "medium", "-f"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Deleted Medium credentials"));

    synd_creds(&config_path)
        .args(["delete", "medium", "--force"])
        .assert()
        .code(4);
}

#[test]
fn test_unknown_platform_is_invalid_input() {
    let (_temp_dir, config_path) = setup_test_env();

    synd_creds(&config_path)
        .args(["enable", "friendster"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Unsupported platform"));
}

#[test]
fn test_invalid_platform_config_json() {
    let (_temp_dir, config_path) = setup_test_env();

    synd_creds(&config_path)
        .args(["set", "medium", "--stdin", "--platform-config", "{not json"])
        .write_stdin("token")
        .assert()
        .failure()
        .code(3);
}
