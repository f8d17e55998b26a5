//! CLI blackbox tests: arguments in, exit status and output out.
//!
//! Nothing here talks to a real model or touches the desktop. Planning is
//! pointed at a closed local port so the "no plan" path is exercised.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// The workspace `vox` binary, next to this test's `deps/` directory
fn vox_binary() -> String {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push(format!("vox{}", std::env::consts::EXE_SUFFIX));
    path.to_string_lossy().to_string()
}

fn vox() -> Command {
    let mut cmd = Command::new(vox_binary());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn config_file(extra: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[providers]
default_provider = "openai.local"

[providers.openai.local]
api_key = "test"
model = "llama3"
base_url = "http://127.0.0.1:9/v1"

[planner]
timeout_seconds = 5
max_retry_attempts = 1
{}
"#,
        extra
    )
    .unwrap();
    file
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_help_flag_produces_output() {
    let output = vox().arg("--help").output().expect("Failed to execute vox --help");

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--show-policy"));
}

#[test]
fn test_version_flag() {
    let output = vox().arg("--version").output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("vox"));
}

#[test]
fn test_invalid_flag_fails() {
    let output = vox().arg("--no-such-flag").output().unwrap();

    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_missing_config_file_fails() {
    let output = vox()
        .args(["-c", "/nonexistent/vox.toml", "--show-policy"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn test_show_policy_prints_builtin_rules() {
    let config = config_file("");
    let output = vox()
        .arg("-c")
        .arg(config.path())
        .arg("--show-policy")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("ms-settings:bluetooth"));
    assert!(stdout.contains("source: built-in"));

    let fingerprint = stdout
        .lines()
        .find_map(|line| line.strip_prefix("fingerprint: "))
        .expect("fingerprint line");
    assert_eq!(fingerprint.len(), 64);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_show_policy_uses_override_file() {
    let mut policy = NamedTempFile::new().unwrap();
    writeln!(policy, "Only ever answer with an empty plan.").unwrap();
    let config = config_file("");

    let output = vox()
        .arg("-c")
        .arg(config.path())
        .arg("--policy")
        .arg(policy.path())
        .arg("--show-policy")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Only ever answer with an empty plan."));
    assert!(!stdout.contains("ms-settings:bluetooth"));
}

#[test]
fn test_dry_run_without_planner_says_not_understood() {
    let config = config_file("");
    let output = vox()
        .arg("-c")
        .arg(config.path())
        .args(["--dry-run", "Open calculator"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("I didn't understand."));
}
