//! Decision types returned by every gate.

/// The gating verdict for a hook invocation.
///
/// Variants are ordered by severity: `Allow < AllowWithWarning < Block`.
/// When several checks contribute to one invocation, the strictest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    /// Continue silently.
    Allow,
    /// Continue, but violations were found and surfaced on stderr.
    AllowWithWarning,
    /// The action is forbidden by policy.
    Block,
}

impl Verdict {
    /// Exit status the harness interprets.
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Allow => 0,
            Verdict::Block => 1,
            Verdict::AllowWithWarning => 2,
        }
    }

    /// Uppercase label for log output.
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Allow => "ALLOW",
            Verdict::AllowWithWarning => "WARN",
            Verdict::Block => "BLOCK",
        }
    }
}

/// A verdict plus the human-readable lines explaining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub messages: Vec<String>,
}

impl Decision {
    pub fn allow() -> Self {
        Self { verdict: Verdict::Allow, messages: Vec::new() }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self { verdict: Verdict::AllowWithWarning, messages: vec![message.into()] }
    }

    pub fn block(message: impl Into<String>) -> Self {
        Self { verdict: Verdict::Block, messages: vec![message.into()] }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Combine two decisions: keep the stricter verdict and all messages.
    pub fn merge(mut self, other: Decision) -> Self {
        self.verdict = self.verdict.max(other.verdict);
        self.messages.extend(other.messages);
        self
    }

    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Block
    }

    pub fn exit_code(&self) -> u8 {
        self.verdict.exit_code()
    }

    /// Write the diagnostics to stderr. Stdout stays untouched.
    pub fn report(&self, hook: &str) {
        tracing::debug!(hook, verdict = self.verdict.label(), messages = self.messages.len(), "decision");
        for message in &self.messages {
            eprintln!("{hook}: {message}");
        }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::allow()
    }
}
