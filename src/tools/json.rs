//! JSON: `jq empty <file>` as a pass/fail syntax check.

use std::path::Path;

use super::executor::{CommandExecutor, Invocation};
use super::{run_binary, ToolOutcome, Violation};

const JQ: &str = "jq";
pub const CATEGORY: &str = "JSON syntax check failed";

pub async fn check(executor: &CommandExecutor, path: &Path) -> ToolOutcome<Vec<Violation>> {
    run_binary(executor, Invocation::new(JQ).arg("empty").arg(path), CATEGORY).await
}
