/// Common utilities for the Claude Code policy hooks

/// Safely truncate a UTF-8 string to a maximum number of characters
pub fn truncate_utf8_safe(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// Language classification for touched files
pub mod analysis;

/// Policy configuration loading with built-in defaults
pub mod config;

/// Allow / warn / block decisions and their exit codes
pub mod decision;

/// Glob-based exclusion of non-source paths
pub mod ignore;

/// Hook invocation parsing (positional arguments or harness JSON on stdin)
pub mod invocation;

/// Tracing subscriber setup shared by the hook binaries
pub mod logging;

/// Write guards, package-manager gate and session-end tamper check
pub mod security;

/// External formatter and checker adapters
pub mod tools;

/// Lint pipeline and fixer delegation
pub mod validation;

/// Version-control collaborator used by the tamper guardian
pub mod vcs;

// Re-export commonly used types for convenience
pub use analysis::{classify, LanguageTag};
pub use config::PolicyConfig;
pub use decision::{Decision, Verdict};
pub use invocation::{HookArgs, HookInput, HookInvocation, ToolKind};
pub use tools::{ToolOutcome, Violation};
