//! Write guard for protected configuration files.
//!
//! Pattern semantics are anchored on path segments:
//! - `name` or `dir/name`: the path equals it or ends with `/` + it
//! - `dir/` (trailing slash): anything under that directory
//! - patterns containing `* ? [ {`: glob, with an implied `**/` prefix when
//!   the pattern is relative
//!
//! A bare `rc` therefore does not match `.bashrc`.

use globset::{Glob, GlobMatcher};

use crate::config::{PolicyConfig, CONFIG_RELATIVE_PATH};
use crate::decision::Decision;
use crate::invocation::ToolKind;

#[derive(Debug, Clone)]
enum PatternKind {
    Literal(String),
    Directory(String),
    Glob(GlobMatcher),
}

#[derive(Debug, Clone)]
struct ProtectedPattern {
    source: String,
    kind: PatternKind,
}

impl ProtectedPattern {
    fn compile(source: &str) -> Option<Self> {
        let normalized = normalize(source);
        if normalized.is_empty() {
            return None;
        }

        let kind = if normalized.contains(&['*', '?', '[', '{'][..]) {
            let anchored = if normalized.starts_with('/') || normalized.starts_with("**") {
                normalized.clone()
            } else {
                format!("**/{normalized}")
            };
            match Glob::new(&anchored) {
                Ok(glob) => PatternKind::Glob(glob.compile_matcher()),
                Err(e) => {
                    tracing::warn!(pattern = source, error = %e, "ignoring invalid protected pattern");
                    return None;
                }
            }
        } else if let Some(dir) = normalized.strip_suffix('/') {
            PatternKind::Directory(dir.to_string())
        } else {
            PatternKind::Literal(normalized.clone())
        };

        Some(Self { source: source.to_string(), kind })
    }

    fn matches(&self, path: &str) -> bool {
        match &self.kind {
            PatternKind::Literal(lit) => path == lit || ends_with_segment(path, lit),
            PatternKind::Directory(dir) => {
                let prefix = format!("{dir}/");
                path.starts_with(&prefix) || path.contains(&format!("/{}", prefix.trim_start_matches('/')))
            }
            PatternKind::Glob(glob) => glob.is_match(path),
        }
    }
}

/// Compiled protected-file patterns, shared by the write guard and the
/// session-end tamper check.
#[derive(Debug, Clone)]
pub struct ProtectedMatcher {
    patterns: Vec<ProtectedPattern>,
}

impl ProtectedMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns.iter().filter_map(|p| ProtectedPattern::compile(p.as_ref())).collect(),
        }
    }

    /// Configured patterns plus the policy document itself, which stays
    /// protected even when a tampered config drops it from the list.
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut matcher = Self::new(config.protected_patterns());
        if !config.protected_patterns().iter().any(|p| p == CONFIG_RELATIVE_PATH) {
            matcher.patterns.extend(ProtectedPattern::compile(CONFIG_RELATIVE_PATH));
        }
        matcher
    }

    /// The first configured pattern protecting `path`, if any
    pub fn matching_pattern(&self, path: &str) -> Option<&str> {
        let path = normalize(path);
        if path.is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .find(|p| p.matches(&path))
            .map(|p| p.source.as_str())
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.matching_pattern(path).is_some()
    }
}

/// Block write-class tool calls that target a protected path
pub fn evaluate(config: &PolicyConfig, tool: &ToolKind, file_path: &str) -> Decision {
    if !tool.is_write_class() || file_path.trim().is_empty() {
        return Decision::allow();
    }

    match ProtectedMatcher::from_config(config).matching_pattern(file_path) {
        Some(pattern) => {
            tracing::info!(path = file_path, pattern, tool = tool.as_str(), "blocked protected file write");
            Decision::block(format!(
                "Blocked: {file_path} is a protected configuration file (matches '{pattern}'). \
                 Fix the violations in the code instead of relaxing lint rules or hook settings."
            ))
        }
        None => Decision::allow(),
    }
}

fn normalize(path: &str) -> String {
    let mut p = path.trim().replace('\\', "/");
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    p
}

fn ends_with_segment(path: &str, suffix: &str) -> bool {
    let suffix = suffix.trim_start_matches('/');
    path.len() > suffix.len()
        && path.ends_with(suffix)
        && path.as_bytes()[path.len() - suffix.len() - 1] == b'/'
}
