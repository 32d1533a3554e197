use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

fn run_pretooluse(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let bin = env!("CARGO_BIN_EXE_pretooluse");
    let mut child = Command::new(bin)
        .args(args)
        .current_dir(dir)
        .env("CLAUDE_PROJECT_DIR", dir)
        .env_remove("HOOKS_CONFIG_FILE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn pretooluse");
    child.stdin.as_mut().unwrap().write_all(stdin.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

fn hook_json(dir: &Path, tool: &str, input: serde_json::Value) -> String {
    serde_json::json!({
        "tool_name": tool,
        "tool_input": input,
        "cwd": dir.to_string_lossy(),
        "hook_event_name": "PreToolUse"
    })
    .to_string()
}

fn write_config(dir: &Path, config: serde_json::Value) {
    std::fs::create_dir_all(dir.join(".claude")).unwrap();
    std::fs::write(dir.join(".claude/hooks-config.json"), config.to_string()).unwrap();
}

#[test]
fn e2e_pretooluse_blocks_protected_write() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let target = dir.join("ruff.toml");
    let input = hook_json(dir, "Edit", serde_json::json!({
        "file_path": target.to_string_lossy(),
        "old_string": "line-length = 88",
        "new_string": "line-length = 400"
    }));

    let out = run_pretooluse(dir, &[], &input);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("ruff.toml"), "{stderr}");
    assert!(stderr.contains("protected"), "{stderr}");
}

#[test]
fn e2e_pretooluse_allows_ordinary_write() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    let target = dir.join("src/app.py");
    let input = hook_json(dir, "Write", serde_json::json!({
        "file_path": target.to_string_lossy(),
        "content": "print('ok')\n"
    }));

    let out = run_pretooluse(dir, &[], &input);
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
}

#[test]
fn e2e_pretooluse_blocks_pip_install_naming_replacement() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    write_config(dir, serde_json::json!({
        "package_managers": {"allowed_subcommands": {"pip": ["list"]}}
    }));
    let input = hook_json(dir, "Bash", serde_json::json!({"command": "pip install requests"}));

    let out = run_pretooluse(dir, &[], &input);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("`uv`"), "{stderr}");

    let listed = hook_json(dir, "Bash", serde_json::json!({"command": "pip list"}));
    assert_eq!(run_pretooluse(dir, &[], &listed).status.code(), Some(0));
}

#[test]
fn e2e_pretooluse_allow_listed_install_passes() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    write_config(dir, serde_json::json!({
        "package_managers": {"allowed_subcommands": {"pip": ["install"]}}
    }));
    let input = hook_json(dir, "Bash", serde_json::json!({"command": "pip install requests"}));
    assert_eq!(run_pretooluse(dir, &[], &input).status.code(), Some(0));
}

#[test]
fn e2e_pretooluse_positional_arguments() {
    let temp = tempdir().unwrap();
    let dir = temp.path();

    let out = run_pretooluse(dir, &["Bash", "cd web && yarn add react"], "");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("`bun`"));

    let out = run_pretooluse(dir, &["Write", ".claude/settings.json"], "");
    assert_eq!(out.status.code(), Some(1));

    let out = run_pretooluse(dir, &["Bash", "ls -la"], "");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn e2e_pretooluse_fails_open_on_bad_input() {
    let temp = tempdir().unwrap();
    let dir = temp.path();

    let out = run_pretooluse(dir, &[], "{not json");
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());

    assert_eq!(run_pretooluse(dir, &[], "").status.code(), Some(0));
}

#[test]
fn e2e_pretooluse_malformed_config_uses_defaults() {
    let temp = tempdir().unwrap();
    let dir = temp.path();
    std::fs::create_dir_all(dir.join(".claude")).unwrap();
    std::fs::write(dir.join(".claude/hooks-config.json"), "{ this is not json").unwrap();

    let input = hook_json(dir, "Bash", serde_json::json!({"command": "poetry add httpx"}));
    assert_eq!(run_pretooluse(dir, &[], &input).status.code(), Some(1));

    let input = hook_json(dir, "Write", serde_json::json!({"file_path": dir.join("main.py").to_string_lossy()}));
    assert_eq!(run_pretooluse(dir, &[], &input).status.code(), Some(0));
}
