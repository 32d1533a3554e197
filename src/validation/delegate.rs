use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::PolicyConfig;
use crate::tools::error::ToolError;
use crate::tools::executor::{CommandExecutor, Invocation};
use crate::tools::{ToolOutcome, Violation};

/// Set in the fixer's environment. A hook that sees it skips delegation, so a
/// fixer's own edits never spawn another fixer.
pub const DELEGATE_ENV: &str = "POLICY_HOOKS_DELEGATE";

/// External repair step handed a remediation instruction
#[allow(async_fn_in_trait)]
pub trait FixerDelegate {
    async fn remediate(&self, instruction: &str) -> ToolOutcome<()>;
}

/// Runs the configured delegate command with the instruction on stdin.
/// Its output is discarded.
#[derive(Debug, Clone)]
pub struct SubprocessDelegate {
    command: Vec<String>,
    executor: CommandExecutor,
    current_dir: Option<PathBuf>,
}

impl SubprocessDelegate {
    pub fn new(command: &[String], timeout: Duration) -> Self {
        Self { command: command.to_vec(), executor: CommandExecutor::new(timeout), current_dir: None }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.delegate_command(), config.delegate_timeout())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl FixerDelegate for SubprocessDelegate {
    async fn remediate(&self, instruction: &str) -> ToolOutcome<()> {
        let Some((program, args)) = self.command.split_first() else {
            tracing::debug!("no delegate command configured");
            return ToolOutcome::Missing;
        };

        let mut invocation = Invocation::new(program.as_str())
            .args(args)
            .stdin(instruction)
            .env(DELEGATE_ENV, "1")
            .discard_output();
        if let Some(dir) = &self.current_dir {
            invocation = invocation.current_dir(dir);
        }

        tracing::debug!(program = %program, timeout_secs = self.executor.timeout().as_secs(), "running fixer delegate");
        match self.executor.run(invocation).await {
            Ok(out) if out.success() => ToolOutcome::Ok(()),
            Ok(out) => ToolOutcome::from_error(ToolError::ExitStatus { program: program.clone(), code: out.code }),
            Err(e) => ToolOutcome::from_error(e),
        }
    }
}

/// Whether this process was itself spawned as a fixer delegate
pub fn is_delegate_process() -> bool {
    std::env::var(DELEGATE_ENV).is_ok_and(|v| !v.is_empty() && v != "0")
}

/// Instruction naming the file and each violation as a literal `line: message` pair
pub fn remediation_instruction(path: &Path, violations: &[Violation]) -> String {
    let mut text = format!(
        "Fix the following lint violations in {}.\n\
         Change the code itself. Do not edit lint or hook configuration and do not add suppression comments.\n\n",
        path.display()
    );
    for v in violations {
        text.push_str(&format!("{}: {}\n", v.line, v.message));
    }
    text
}
