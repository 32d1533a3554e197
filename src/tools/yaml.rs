//! YAML: `yamllint -f parsable`, one finding per line:
//! `file:line:col: [level] message (rule)`

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::executor::{CommandExecutor, Invocation};
use super::{run_structured, ToolOutcome, Violation};

const YAMLLINT: &str = "yamllint";

/// 1 = errors found, 2 = warnings only under `--strict`
const NORMAL_EXIT_CODES: &[i32] = &[0, 1, 2];

static PARSABLE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>.*?):(?P<line>\d+):(?P<col>\d+): \[(?P<level>[a-z]+)\] (?P<msg>.*?)(?: \((?P<rule>[\w-]+)\))?$")
        .expect("valid yamllint regex")
});

pub async fn check(executor: &CommandExecutor, path: &Path) -> ToolOutcome<Vec<Violation>> {
    let inv = Invocation::new(YAMLLINT).args(["-f", "parsable"]).arg(path);
    run_structured(executor, inv, NORMAL_EXIT_CODES, parse_report).await
}

pub fn parse_report(stdout: &str) -> Result<Vec<Violation>, String> {
    let mut violations = Vec::new();
    let mut unmatched = 0usize;
    for line in stdout.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
        let Some(caps) = PARSABLE_LINE.captures(line) else {
            unmatched += 1;
            continue;
        };
        let line_no = caps["line"].parse::<i64>().unwrap_or(1);
        let rule = caps.name("rule").map(|m| m.as_str().to_string());
        if let Some(v) = Violation::new(line_no, &caps["msg"], rule) {
            violations.push(v);
        }
    }
    if violations.is_empty() && unmatched > 0 {
        return Err(format!("{unmatched} line(s) not in parsable format"));
    }
    Ok(violations)
}
