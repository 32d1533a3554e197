//! Markdown: `markdownlint <file>` as a pass/fail check.

use std::path::Path;

use super::executor::{CommandExecutor, Invocation};
use super::{run_binary, ToolOutcome, Violation};

const MARKDOWNLINT: &str = "markdownlint";
pub const CATEGORY: &str = "Markdown lint failed";

pub async fn check(executor: &CommandExecutor, path: &Path) -> ToolOutcome<Vec<Violation>> {
    run_binary(executor, Invocation::new(MARKDOWNLINT).arg(path), CATEGORY).await
}
