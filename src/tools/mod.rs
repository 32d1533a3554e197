//! Per-language adapters over external formatters and checkers.
//!
//! Each adapter wraps exactly one tool. Absence of a tool, a crash, a timeout
//! or unreadable output never becomes an error for the caller: the adapter
//! returns a [`ToolOutcome`] and the pipeline treats everything except
//! `Ok` as the neutral value.

pub mod dockerfile;
pub mod error;
pub mod executor;
pub mod json;
pub mod markdown;
pub mod python;
pub mod shell;
pub mod toml;
pub mod yaml;

use std::path::Path;
use std::time::Duration;

use crate::analysis::LanguageTag;
use error::ToolError;
use executor::{CommandExecutor, Invocation};

/// A single reported rule breach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based line number
    pub line: u32,
    pub message: String,
    pub rule: Option<String>,
}

impl Violation {
    /// Build a violation, clamping the line to at least 1. Returns `None`
    /// for an empty message.
    pub fn new(line: i64, message: impl Into<String>, rule: Option<String>) -> Option<Self> {
        let message = message.into().trim().to_string();
        if message.is_empty() {
            return None;
        }
        let line = u32::try_from(line.max(1)).unwrap_or(u32::MAX);
        let rule = rule.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        Some(Self { line, message, rule })
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.line, self.message)?;
        if let Some(rule) = &self.rule {
            write!(f, " [{rule}]")?;
        }
        Ok(())
    }
}

/// Tagged result of one external tool call.
///
/// `Missing` and `Ok(vec![])` lead to the same policy decision, but stay
/// distinct so callers can report them differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome<T> {
    Ok(T),
    Missing,
    Errored(String),
    TimedOut,
}

impl<T> ToolOutcome<T> {
    pub fn from_error(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(_) => ToolOutcome::Missing,
            ToolError::Timeout { .. } => ToolOutcome::TimedOut,
            other => ToolOutcome::Errored(other.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutcome::Ok(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToolOutcome::Ok(_) => "ok",
            ToolOutcome::Missing => "missing",
            ToolOutcome::Errored(_) => "errored",
            ToolOutcome::TimedOut => "timed out",
        }
    }
}

/// Format-in-place and check-and-report for one file
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    async fn format(&self, language: LanguageTag, path: &Path) -> ToolOutcome<()>;
    async fn check(&self, language: LanguageTag, path: &Path) -> ToolOutcome<Vec<Violation>>;
}

/// Whether a formatter is defined for the language
pub fn has_formatter(language: LanguageTag) -> bool {
    matches!(language, LanguageTag::Python | LanguageTag::Shell)
}

/// Runs the real external tools found on PATH
#[derive(Debug, Clone)]
pub struct ExternalTools {
    executor: CommandExecutor,
}

impl ExternalTools {
    pub fn new(timeout: Duration) -> Self {
        Self { executor: CommandExecutor::new(timeout) }
    }
}

impl ToolRunner for ExternalTools {
    async fn format(&self, language: LanguageTag, path: &Path) -> ToolOutcome<()> {
        match language {
            LanguageTag::Python => python::format(&self.executor, path).await,
            LanguageTag::Shell => shell::format(&self.executor, path).await,
            _ => ToolOutcome::Ok(()),
        }
    }

    async fn check(&self, language: LanguageTag, path: &Path) -> ToolOutcome<Vec<Violation>> {
        match language {
            LanguageTag::Python => python::check(&self.executor, path).await,
            LanguageTag::Shell => shell::check(&self.executor, path).await,
            LanguageTag::Yaml => yaml::check(&self.executor, path).await,
            LanguageTag::Dockerfile => dockerfile::check(&self.executor, path).await,
            LanguageTag::Json => json::check(&self.executor, path).await,
            LanguageTag::Toml => toml::check(&self.executor, path).await,
            LanguageTag::Markdown => markdown::check(&self.executor, path).await,
            LanguageTag::Unknown => ToolOutcome::Ok(Vec::new()),
        }
    }
}

/// Run a formatter for its in-place effect; exit status is ignored
pub(crate) async fn run_formatter(executor: &CommandExecutor, invocation: Invocation) -> ToolOutcome<()> {
    let program = invocation.program().to_string();
    match executor.run(invocation).await {
        Ok(out) => {
            if !out.success() {
                tracing::debug!(program = %program, code = ?out.code, "formatter exited non-zero");
            }
            ToolOutcome::Ok(())
        }
        Err(e) => ToolOutcome::from_error(e),
    }
}

/// Run a checker with structured output. Exit codes outside `normal_codes`
/// or unparseable output degrade to `Errored`.
pub(crate) async fn run_structured<F>(
    executor: &CommandExecutor,
    invocation: Invocation,
    normal_codes: &[i32],
    parse: F,
) -> ToolOutcome<Vec<Violation>>
where
    F: FnOnce(&str) -> Result<Vec<Violation>, String>,
{
    let program = invocation.program().to_string();
    let out = match executor.run(invocation).await {
        Ok(out) => out,
        Err(e) => return ToolOutcome::from_error(e),
    };

    if !out.code.is_some_and(|code| normal_codes.contains(&code)) {
        let err = ToolError::ExitStatus { program, code: out.code };
        tracing::debug!(error = %err, stderr = %out.stderr.trim(), "checker failed");
        return match out.first_diagnostic_line() {
            Some(detail) => ToolOutcome::Errored(format!("{err} ({})", crate::truncate_utf8_safe(detail, 200))),
            None => ToolOutcome::from_error(err),
        };
    }

    if out.stdout.trim().is_empty() {
        return ToolOutcome::Ok(Vec::new());
    }

    match parse(&out.stdout) {
        Ok(violations) => ToolOutcome::Ok(violations),
        Err(reason) => {
            let err = ToolError::Parse { program, reason };
            tracing::debug!(error = %err, "checker output unreadable");
            ToolOutcome::from_error(err)
        }
    }
}

/// Run a pass/fail checker. A non-zero exit becomes one synthetic violation
/// at line 1 naming the failed check category.
pub(crate) async fn run_binary(
    executor: &CommandExecutor,
    invocation: Invocation,
    category: &str,
) -> ToolOutcome<Vec<Violation>> {
    match executor.run(invocation).await {
        Ok(out) if out.success() => ToolOutcome::Ok(Vec::new()),
        Ok(out) => {
            let message = match out.first_diagnostic_line() {
                Some(detail) => format!("{category}: {}", crate::truncate_utf8_safe(detail, 200)),
                None => category.to_string(),
            };
            ToolOutcome::Ok(Violation::new(1, message, None).into_iter().collect())
        }
        Err(e) => ToolOutcome::from_error(e),
    }
}
