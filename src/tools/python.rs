//! Python: `ruff format` in place, `ruff check` with JSON output.

use std::path::Path;

use serde::Deserialize;

use super::executor::{CommandExecutor, Invocation};
use super::{run_formatter, run_structured, ToolOutcome, Violation};

const RUFF: &str = "ruff";

#[derive(Debug, Deserialize)]
struct RuffDiagnostic {
    code: Option<String>,
    message: String,
    location: Option<RuffLocation>,
}

#[derive(Debug, Deserialize)]
struct RuffLocation {
    row: i64,
}

pub async fn format(executor: &CommandExecutor, path: &Path) -> ToolOutcome<()> {
    let inv = Invocation::new(RUFF).args(["format", "--quiet"]).arg(path);
    run_formatter(executor, inv).await
}

/// `--exit-zero` keeps "violations found" at status 0, so any other status
/// means ruff itself failed.
pub async fn check(executor: &CommandExecutor, path: &Path) -> ToolOutcome<Vec<Violation>> {
    let inv = Invocation::new(RUFF)
        .args(["check", "--output-format", "json", "--exit-zero", "--no-fix"])
        .arg(path);
    run_structured(executor, inv, &[0], parse_report).await
}

pub fn parse_report(stdout: &str) -> Result<Vec<Violation>, String> {
    let diagnostics: Vec<RuffDiagnostic> = serde_json::from_str(stdout).map_err(|e| e.to_string())?;
    Ok(diagnostics
        .into_iter()
        .filter_map(|d| {
            let line = d.location.map(|l| l.row).unwrap_or(1);
            Violation::new(line, d.message, d.code)
        })
        .collect())
}
