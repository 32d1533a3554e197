use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

fn git(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=hooks", "-c", "user.email=hooks@example.com", "-c", "commit.gpgsign=false"])
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Committed repo with one protected config and one source file, or `None`
/// when git is unavailable.
fn committed_repo(dir: &Path) -> Option<()> {
    if !git(dir, &["init", "-q"]) {
        return None;
    }
    std::fs::write(dir.join(".shellcheckrc"), "enable=all\n").unwrap();
    std::fs::write(dir.join("build.sh"), "#!/bin/sh\necho build\n").unwrap();
    if !(git(dir, &["add", "."]) && git(dir, &["commit", "-qm", "init"])) {
        return None;
    }
    Some(())
}

fn run_stop(args: &[&str], project_dir: Option<&Path>, stdin: &str) -> Output {
    let bin = env!("CARGO_BIN_EXE_stop");
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .env_remove("CLAUDE_PROJECT_DIR")
        .env_remove("HOOKS_CONFIG_FILE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = project_dir {
        cmd.env("CLAUDE_PROJECT_DIR", dir);
    }
    let mut child = cmd.spawn().expect("spawn stop");
    child.stdin.as_mut().unwrap().write_all(stdin.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn e2e_stop_reverts_tampered_repo() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    if committed_repo(dir).is_none() {
        eprintln!("git unavailable, skipping");
        return;
    }
    std::fs::write(dir.join(".shellcheckrc"), "disable=all\n").unwrap();
    std::fs::write(dir.join("build.sh"), "#!/bin/sh\necho changed\n").unwrap();

    let out = run_stop(&[dir.to_str().unwrap()], None, "");
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(".shellcheckrc"), "{stderr}");
    assert!(!stderr.contains("build.sh"), "{stderr}");

    assert_eq!(std::fs::read_to_string(dir.join(".shellcheckrc")).unwrap(), "enable=all\n");
    assert_eq!(std::fs::read_to_string(dir.join("build.sh")).unwrap(), "#!/bin/sh\necho build\n");
}

#[test]
fn e2e_stop_leaves_untampered_changes() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    if committed_repo(dir).is_none() {
        eprintln!("git unavailable, skipping");
        return;
    }
    std::fs::write(dir.join("build.sh"), "#!/bin/sh\necho changed\n").unwrap();

    let out = run_stop(&[], Some(dir), r#"{"hook_event_name":"Stop","stop_hook_active":false}"#);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(std::fs::read_to_string(dir.join("build.sh")).unwrap(), "#!/bin/sh\necho changed\n");
}

#[test]
fn e2e_stop_uses_harness_cwd() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    if committed_repo(dir).is_none() {
        eprintln!("git unavailable, skipping");
        return;
    }
    std::fs::write(dir.join(".shellcheckrc"), "disable=all\n").unwrap();

    let input = serde_json::json!({"hook_event_name": "Stop", "cwd": dir.to_string_lossy()}).to_string();
    let out = run_stop(&[], None, &input);
    assert_eq!(out.status.code(), Some(2));
    assert_eq!(std::fs::read_to_string(dir.join(".shellcheckrc")).unwrap(), "enable=all\n");
}

#[test]
fn e2e_stop_outside_repository_is_a_no_op() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    std::fs::write(dir.join("ruff.toml"), "line-length = 400\n").unwrap();

    let out = run_stop(&[dir.to_str().unwrap()], None, "");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(std::fs::read_to_string(dir.join("ruff.toml")).unwrap(), "line-length = 400\n");
}
