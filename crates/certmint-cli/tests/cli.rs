//! End-to-end tests for the certmint binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn certmint(caroot: &TempDir, home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("certmint").unwrap();
    cmd.env("CAROOT", caroot.path())
        .env("HOME", home.path())
        .env("TRUST_STORES", "system")
        .env_remove("JAVA_HOME");
    cmd
}

fn dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

#[test]
fn conflicting_modes_are_rejected_without_side_effects() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .args(["--install", "--uninstall"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "--install and --uninstall at the same time",
        ));

    assert!(dir_is_empty(&caroot));
}

#[test]
fn csr_excludes_issuance_flags() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .args(["--csr", "req.pem", "--ecdsa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--csr"));

    assert!(dir_is_empty(&caroot));
}

#[test]
fn csr_excludes_positional_subjects() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .args(["--csr", "req.pem", "example.org"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("subjects"));

    assert!(dir_is_empty(&caroot));
}

#[test]
fn empty_invocation_is_a_usage_error() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one"));

    assert!(dir_is_empty(&caroot));
}

#[test]
fn caroot_query_prints_the_override_without_creating_a_ca() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .arg("--caroot")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            caroot.path().to_string_lossy().into_owned(),
        ));

    assert!(dir_is_empty(&caroot));
}

#[test]
fn generates_the_named_pem_pair() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .current_dir(workdir.path())
        .args(["--ecdsa", "example.org"])
        .assert()
        .success();

    assert!(workdir.path().join("example.org.pem").exists());
    assert!(workdir.path().join("example.org-key.pem").exists());
    assert!(caroot.path().join("rootCA.pem").exists());
    assert!(caroot.path().join("rootCA-key.pem").exists());
}

#[test]
fn second_run_reuses_the_ca() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .current_dir(workdir.path())
        .args(["--ecdsa", "one.test"])
        .assert()
        .success();
    let root_cert = std::fs::read(caroot.path().join("rootCA.pem")).unwrap();

    certmint(&caroot, &home)
        .current_dir(workdir.path())
        .args(["--ecdsa", "two.test"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read(caroot.path().join("rootCA.pem")).unwrap(),
        root_cert
    );
    assert!(workdir.path().join("one.test.pem").exists());
    assert!(workdir.path().join("two.test.pem").exists());
}

#[test]
fn multiple_subjects_use_the_count_suffix() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .current_dir(workdir.path())
        .args(["--ecdsa", "example.com", "myapp.dev", "127.0.0.1"])
        .assert()
        .success();

    assert!(workdir.path().join("example.com+2.pem").exists());
    assert!(workdir.path().join("example.com+2-key.pem").exists());
}

#[test]
fn invalid_subject_reports_the_offending_input() {
    let caroot = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();

    certmint(&caroot, &home)
        .current_dir(workdir.path())
        .args(["--ecdsa", "*bad.example"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("*bad.example"));

    assert!(!workdir.path().join("_wildcardbad.example.pem").exists());
}
