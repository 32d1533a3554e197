//! Shell: `shfmt -w` in place, `shellcheck -f json`.

use std::path::Path;

use serde::Deserialize;

use super::executor::{CommandExecutor, Invocation};
use super::{run_formatter, run_structured, ToolOutcome, Violation};

const SHFMT: &str = "shfmt";
const SHELLCHECK: &str = "shellcheck";

/// shellcheck exits 1 when it reports findings; anything above is a failure
const NORMAL_EXIT_CODES: &[i32] = &[0, 1];

#[derive(Debug, Deserialize)]
struct ShellcheckComment {
    line: i64,
    code: Option<u32>,
    message: String,
}

pub async fn format(executor: &CommandExecutor, path: &Path) -> ToolOutcome<()> {
    run_formatter(executor, Invocation::new(SHFMT).arg("-w").arg(path)).await
}

pub async fn check(executor: &CommandExecutor, path: &Path) -> ToolOutcome<Vec<Violation>> {
    let inv = Invocation::new(SHELLCHECK).args(["-f", "json"]).arg(path);
    run_structured(executor, inv, NORMAL_EXIT_CODES, parse_report).await
}

pub fn parse_report(stdout: &str) -> Result<Vec<Violation>, String> {
    let comments: Vec<ShellcheckComment> = serde_json::from_str(stdout).map_err(|e| e.to_string())?;
    Ok(comments
        .into_iter()
        .filter_map(|c| Violation::new(c.line, c.message, c.code.map(|code| format!("SC{code}"))))
        .collect())
}
