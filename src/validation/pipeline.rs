//! Post-write lint pipeline: format, collect violations, delegate a fix.

use std::path::{Path, PathBuf};

use crate::analysis::{classify, LanguageTag};
use crate::config::PolicyConfig;
use crate::decision::Decision;
use crate::ignore::ExclusionSet;
use crate::invocation::ToolKind;
use crate::tools::{has_formatter, ToolOutcome, ToolRunner};

use super::delegate::{is_delegate_process, remediation_instruction, FixerDelegate};

pub struct LintPipeline<'a, R, D> {
    config: &'a PolicyConfig,
    root: &'a Path,
    runner: &'a R,
    delegate: &'a D,
    inside_delegate: bool,
}

impl<'a, R: ToolRunner, D: FixerDelegate> LintPipeline<'a, R, D> {
    pub fn new(config: &'a PolicyConfig, root: &'a Path, runner: &'a R, delegate: &'a D) -> Self {
        Self { config, root, runner, delegate, inside_delegate: is_delegate_process() }
    }

    /// Override the recursion guard read from the environment
    pub fn inside_delegate(mut self, inside: bool) -> Self {
        self.inside_delegate = inside;
        self
    }

    pub async fn run(&self, tool: &ToolKind, file_path: &str) -> Decision {
        if !tool.is_write_class() || file_path.trim().is_empty() {
            return Decision::allow();
        }

        let path = self.resolve(file_path);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "target is not a file, nothing to lint");
            return Decision::allow();
        }

        let exclusions = ExclusionSet::new(self.config.exclusions());
        if exclusions.is_excluded_under(self.root, &path) {
            tracing::debug!(path = %path.display(), "excluded");
            return Decision::allow();
        }

        let language = classify(&path);
        if language == LanguageTag::Unknown || !self.config.is_language_enabled(language) {
            tracing::debug!(path = %path.display(), language = %language, "language not linted");
            return Decision::allow();
        }

        if self.config.is_auto_format_enabled() && has_formatter(language) {
            let outcome = self.runner.format(language, &path).await;
            tracing::debug!(language = %language, outcome = outcome.label(), "format phase");
        }

        let violations = match self.runner.check(language, &path).await {
            ToolOutcome::Ok(violations) => violations,
            ToolOutcome::Missing => {
                tracing::debug!(language = %language, "checker not installed, treating as clean");
                return Decision::allow();
            }
            ToolOutcome::TimedOut => {
                tracing::warn!(language = %language, path = %path.display(), "checker timed out");
                return Decision::allow()
                    .with_message(format!("{language} checker timed out; {} was not checked", path.display()));
            }
            ToolOutcome::Errored(reason) => {
                tracing::warn!(language = %language, path = %path.display(), reason = %reason, "checker failed");
                return Decision::allow()
                    .with_message(format!("{language} checker failed: {reason}; {} was not checked", path.display()));
            }
        };
        if violations.is_empty() {
            return Decision::allow();
        }

        let noun = if violations.len() == 1 { "violation" } else { "violations" };
        let mut decision = Decision::warn(format!("{} {noun} in {}", violations.len(), path.display()));
        for v in &violations {
            decision = decision.with_message(format!("  {v}"));
        }

        if !self.config.is_subprocess_enabled() {
            return decision;
        }
        if self.inside_delegate {
            tracing::debug!("running inside a fixer delegate, not delegating again");
            return decision;
        }

        let instruction = remediation_instruction(&path, &violations);
        match self.delegate.remediate(&instruction).await {
            ToolOutcome::Ok(()) => {
                tracing::debug!(path = %path.display(), "fixer delegate finished");
                decision
            }
            ToolOutcome::Missing => decision.with_message("Fixer delegate not found; fix the violations above manually."),
            ToolOutcome::TimedOut => decision.with_message("Fixer delegate timed out; fix the violations above manually."),
            ToolOutcome::Errored(reason) => decision.with_message(format!("Fixer delegate failed: {reason}")),
        }
    }

    fn resolve(&self, file_path: &str) -> PathBuf {
        let path = Path::new(file_path.trim());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
