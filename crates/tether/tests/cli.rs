//! End-to-end tests for the tether binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tether(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tether").unwrap();
    cmd.env_remove("RUST_LOG").arg("--root").arg(root.path());
    cmd
}

#[test]
fn assemble_json_is_sorted_by_destination() {
    let root = TempDir::new().unwrap();

    let output = tether(&root)
        .args(["assemble", "web", "--format", "json"])
        .args(["-v", "data:/data", "-v", "/host/cache:/cache:ro"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let mounts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let data_dir = root.path().join("volumes/data/_data");
    assert_eq!(
        mounts,
        serde_json::json!([
            { "source": "/host/cache", "destination": "/cache", "writable": false },
            { "source": data_dir, "destination": "/data", "writable": true },
        ])
    );
    assert!(data_dir.is_dir());
}

#[test]
fn assemble_oci_format() {
    let root = TempDir::new().unwrap();

    tether(&root)
        .args(["assemble", "--format", "oci", "-v", "/srv/logs:/logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"bind\""))
        .stdout(predicate::str::contains("\"rbind\""));
}

#[test]
fn invalid_bind_fails() {
    let root = TempDir::new().unwrap();

    tether(&root)
        .args(["assemble", "web", "-v", "data:relative"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid bind specification"));
}

#[test]
fn duplicate_destination_fails() {
    let root = TempDir::new().unwrap();

    tether(&root)
        .args(["assemble", "web", "-v", "/a:/data", "-v", "/b:/data"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate mount point"));
}

#[test]
fn volume_lifecycle() {
    let root = TempDir::new().unwrap();

    tether(&root)
        .args(["volume", "create", "cache", "--label", "tier=db"])
        .assert()
        .success()
        .stdout("cache\n");

    tether(&root)
        .args(["volume", "create", "cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    tether(&root)
        .args(["volume", "ls", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tier\": \"db\""));

    tether(&root)
        .args(["volume", "rm", "cache"])
        .assert()
        .success();

    tether(&root)
        .args(["volume", "rm", "cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Volume not found"));
}
