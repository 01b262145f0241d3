#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_stub(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Clean stubs for every tool that answers on this PATH; the rest of the
/// registry resolves to nothing and is skipped.
fn stub_clean_tools(bin: &Path) {
    write_stub(
        bin,
        "bandit",
        "#!/bin/sh\nprintf '%s' '{\"results\": [], \"errors\": []}'\n",
    );
    write_stub(
        bin,
        "npm",
        r#"#!/bin/sh
case "$1" in
    audit) printf '%s' '{"advisories":{},"metadata":{"vulnerabilities":{"total":0}}}' ;;
    outdated) printf '%s' '{}' ;;
esac
"#,
    );
    write_stub(bin, "pip", "#!/bin/sh\nprintf '%s' '[]'\n");
    write_stub(
        bin,
        "semgrep",
        "#!/bin/sh\nprintf '%s' '{\"results\": [], \"errors\": []}'\n",
    );
}

fn scan_gate(bin: &Path) -> Command {
    let mut cmd = Command::cargo_bin("scan-gate-cli").unwrap();
    cmd.env_clear().env("PATH", bin);
    cmd
}

fn report_in(dir: &Path) -> String {
    let entry = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .find(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .expect("a report file should exist");
    fs::read_to_string(entry.path()).unwrap()
}

#[test]
fn clean_scan_passes_with_exit_zero() {
    let temp = tempfile::tempdir().unwrap();
    let bin = temp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    stub_clean_tools(&bin);
    let report_dir = temp.path().join("reports");

    scan_gate(&bin)
        .args([
            "scan",
            "--target",
            temp.path().to_str().unwrap(),
            "--report-dir",
            report_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gate: PASS"));

    let report = report_in(&report_dir);
    assert!(report.contains("**Overall: PASS**"));
    assert!(report.contains("section skipped"));
}

#[test]
fn findings_fail_the_gate_with_exit_one() {
    let temp = tempfile::tempdir().unwrap();
    let bin = temp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    stub_clean_tools(&bin);
    write_stub(
        &bin,
        "gitleaks",
        r#"#!/bin/sh
printf '%s' '[{"Description": "AWS Access Key", "File": "deploy/config.env", "StartLine": 3}]'
exit 1
"#,
    );
    let report_dir = temp.path().join("reports");

    scan_gate(&bin)
        .args([
            "scan",
            "--target",
            temp.path().to_str().unwrap(),
            "--report-dir",
            report_dir.to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Gate: FAIL"));

    let report = report_in(&report_dir);
    assert!(report.contains("- **[HIGH]** AWS Access Key (deploy/config.env:3)"));
    assert!(report.contains("- HIGH: 1"));
}

#[test]
fn config_file_sets_the_report_dir() {
    let temp = tempfile::tempdir().unwrap();
    let bin = temp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    stub_clean_tools(&bin);
    let report_dir = temp.path().join("from-config");
    let config_path = temp.path().join("scan-gate.toml");
    fs::write(
        &config_path,
        format!(
            "target = \"{}\"\nreport_dir = \"{}\"\ntimeout = \"30s\"\n",
            temp.path().display(),
            report_dir.display()
        ),
    )
    .unwrap();

    scan_gate(&bin)
        .args(["--config", config_path.to_str().unwrap(), "scan"])
        .assert()
        .success();

    assert!(report_dir.exists());
    assert!(report_in(&report_dir).contains("# Security Scan Report"));
}

#[test]
fn json_flag_prints_the_machine_readable_run() {
    let temp = tempfile::tempdir().unwrap();
    let bin = temp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    stub_clean_tools(&bin);
    let report_dir = temp.path().join("reports");

    scan_gate(&bin)
        .args([
            "scan",
            "--target",
            temp.path().to_str().unwrap(),
            "--report-dir",
            report_dir.to_str().unwrap(),
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"gate\": \"pass\""))
        .stdout(predicate::str::contains("\"severity_counts\""));
}
