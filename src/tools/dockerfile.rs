//! Dockerfile: `hadolint -f json`. No formatter.

use std::path::Path;

use serde::Deserialize;

use super::executor::{CommandExecutor, Invocation};
use super::{run_structured, ToolOutcome, Violation};

const HADOLINT: &str = "hadolint";

/// hadolint exits 1 when findings reach its failure threshold
const NORMAL_EXIT_CODES: &[i32] = &[0, 1];

#[derive(Debug, Deserialize)]
struct HadolintFinding {
    line: i64,
    code: Option<String>,
    message: String,
}

pub async fn check(executor: &CommandExecutor, path: &Path) -> ToolOutcome<Vec<Violation>> {
    let inv = Invocation::new(HADOLINT).args(["-f", "json"]).arg(path);
    run_structured(executor, inv, NORMAL_EXIT_CODES, parse_report).await
}

pub fn parse_report(stdout: &str) -> Result<Vec<Violation>, String> {
    let findings: Vec<HadolintFinding> = serde_json::from_str(stdout).map_err(|e| e.to_string())?;
    Ok(findings
        .into_iter()
        .filter_map(|f| Violation::new(f.line, f.message, f.code))
        .collect())
}
