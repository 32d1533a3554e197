//! Policy gates that run before a tool call and at session end.

pub mod command_gate;
pub mod protected_files;
pub mod tamper;

pub use protected_files::ProtectedMatcher;
pub use tamper::check_and_revert;

use crate::config::PolicyConfig;
use crate::decision::Decision;
use crate::invocation::{HookInvocation, ToolKind};

/// Pre-tool-use policy: write-class tools go through the protected-file
/// guard, Bash through the command gate, everything else is allowed.
pub fn evaluate_pre_tool_use(config: &PolicyConfig, invocation: &HookInvocation) -> Decision {
    match &invocation.tool {
        tool if tool.is_write_class() => protected_files::evaluate(config, tool, &invocation.payload),
        tool @ ToolKind::Bash => command_gate::evaluate(config, tool, &invocation.payload),
        _ => Decision::allow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Verdict;

    #[test]
    fn dispatches_by_tool() {
        let cfg = PolicyConfig::default();
        let verdict = |tool: &str, payload: &str| evaluate_pre_tool_use(&cfg, &HookInvocation::new(tool, payload)).verdict;

        assert_eq!(verdict("Edit", "/p/.ruff.toml"), Verdict::Block);
        assert_eq!(verdict("Edit", "/p/src/main.py"), Verdict::Allow);
        assert_eq!(verdict("Bash", "yarn install"), Verdict::Block);
        assert_eq!(verdict("Bash", "cat pyproject.toml"), Verdict::Allow);
        assert_eq!(verdict("Read", "pyproject.toml"), Verdict::Allow);
        assert_eq!(verdict("", ""), Verdict::Allow);
    }
}
