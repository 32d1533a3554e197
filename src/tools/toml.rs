//! TOML: `taplo check <file>` as a pass/fail validation.

use std::path::Path;

use super::executor::{CommandExecutor, Invocation};
use super::{run_binary, ToolOutcome, Violation};

const TAPLO: &str = "taplo";
pub const CATEGORY: &str = "TOML validation failed";

pub async fn check(executor: &CommandExecutor, path: &Path) -> ToolOutcome<Vec<Violation>> {
    run_binary(executor, Invocation::new(TAPLO).arg("check").arg(path), CATEGORY).await
}
