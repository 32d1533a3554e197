use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::analysis::LanguageTag;

/// Project-relative location of the policy document
pub const CONFIG_RELATIVE_PATH: &str = ".claude/hooks-config.json";

/// Env override for the policy document path (absolute or root-relative)
pub const CONFIG_FILE_ENV: &str = "HOOKS_CONFIG_FILE";

/// Env var naming the project root
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "**/tests/**",
    "**/test/**",
    "**/docs/**",
    "**/node_modules/**",
    "**/.venv/**",
    "**/venv/**",
    "**/.git/**",
    "**/__pycache__/**",
    "**/vendor/**",
    "**/dist/**",
    "**/build/**",
];

pub const DEFAULT_PROTECTED_FILES: &[&str] = &[
    ".claude/hooks-config.json",
    ".claude/settings.json",
    ".claude/settings.local.json",
    ".claude/hooks/",
    "pyproject.toml",
    "ruff.toml",
    ".ruff.toml",
    ".shellcheckrc",
    ".yamllint",
    ".yamllint.yaml",
    ".yamllint.yml",
    ".hadolint.yaml",
    ".markdownlint.json",
    "taplo.toml",
    ".taplo.toml",
];

pub const DEFAULT_PYTHON_MANAGER: &str = "uv";
pub const DEFAULT_JAVASCRIPT_MANAGER: &str = "bun";
pub const DEFAULT_DELEGATE_COMMAND: &[&str] = &["claude", "-p"];
pub const DEFAULT_DELEGATE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

/// Package-manager ecosystems the command gate knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Python,
    JavaScript,
}

impl Ecosystem {
    pub fn as_str(self) -> &'static str {
        match self {
            Ecosystem::Python => "Python",
            Ecosystem::JavaScript => "JavaScript",
        }
    }
}

/// Resolved policy for one hook invocation.
///
/// Built once per invocation and passed by reference to every gate; nothing
/// mutates it after [`load`] returns. Every field already has its default
/// applied, so the accessors never fail.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    languages: HashMap<String, bool>,
    exclusions: Vec<String>,
    auto_format: bool,
    subprocess_delegation: bool,
    allowed_subcommands: HashMap<String, Vec<String>>,
    python_manager: String,
    javascript_manager: String,
    protected_files: Vec<String>,
    delegate_command: Vec<String>,
    delegate_timeout: Duration,
    tool_timeout: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            languages: HashMap::new(),
            exclusions: to_strings(DEFAULT_EXCLUSIONS),
            auto_format: true,
            subprocess_delegation: true,
            allowed_subcommands: HashMap::new(),
            python_manager: DEFAULT_PYTHON_MANAGER.to_string(),
            javascript_manager: DEFAULT_JAVASCRIPT_MANAGER.to_string(),
            protected_files: to_strings(DEFAULT_PROTECTED_FILES),
            delegate_command: to_strings(DEFAULT_DELEGATE_COMMAND),
            delegate_timeout: Duration::from_secs(DEFAULT_DELEGATE_TIMEOUT_SECS),
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        }
    }
}

impl PolicyConfig {
    /// Resolve a policy from a parsed JSON document. Keys that are absent or
    /// have an unexpected shape keep their defaults.
    pub fn from_json(json: &Value) -> Self {
        let mut cfg = Self::default();

        if let Some(languages) = json.get("languages").and_then(|v| v.as_object()) {
            for (name, enabled) in languages {
                if let Some(enabled) = enabled.as_bool() {
                    cfg.languages.insert(name.to_ascii_lowercase(), enabled);
                }
            }
        }

        if let Some(list) = string_array(json.get("exclusions")) {
            cfg.exclusions = list;
        }

        if let Some(phases) = json.get("phases") {
            if let Some(v) = phases.get("auto_format").and_then(|v| v.as_bool()) {
                cfg.auto_format = v;
            }
            if let Some(v) = phases.get("subprocess_delegation").and_then(|v| v.as_bool()) {
                cfg.subprocess_delegation = v;
            }
        }

        if let Some(managers) = json.get("package_managers") {
            if let Some(name) = non_empty_str(managers.get("python")) {
                cfg.python_manager = name;
            }
            if let Some(name) = non_empty_str(managers.get("javascript")) {
                cfg.javascript_manager = name;
            }
            if let Some(tools) = managers.get("allowed_subcommands").and_then(|v| v.as_object()) {
                for (tool, subcommands) in tools {
                    if let Some(list) = string_array(Some(subcommands)) {
                        cfg.allowed_subcommands.insert(tool.clone(), list);
                    }
                }
            }
        }

        if let Some(list) = string_array(json.get("protected_files")) {
            cfg.protected_files = list;
        }

        if let Some(delegate) = json.get("delegate") {
            if let Some(command) = string_array(delegate.get("command")) {
                if !command.is_empty() {
                    cfg.delegate_command = command;
                }
            }
            if let Some(secs) = positive_secs(delegate.get("timeout_secs")) {
                cfg.delegate_timeout = secs;
            }
        }

        if let Some(secs) = json.get("tools").and_then(|t| positive_secs(t.get("timeout_secs"))) {
            cfg.tool_timeout = secs;
        }

        cfg
    }

    pub fn is_language_enabled(&self, language: LanguageTag) -> bool {
        self.languages.get(language.as_str()).copied().unwrap_or(true)
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    pub fn is_auto_format_enabled(&self) -> bool {
        self.auto_format
    }

    pub fn is_subprocess_enabled(&self) -> bool {
        self.subprocess_delegation
    }

    /// Subcommands explicitly allowed for a legacy tool; empty when unset
    pub fn allowed_subcommands(&self, tool: &str) -> &[String] {
        self.allowed_subcommands
            .get(tool)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn enforced_manager(&self, ecosystem: Ecosystem) -> &str {
        match ecosystem {
            Ecosystem::Python => &self.python_manager,
            Ecosystem::JavaScript => &self.javascript_manager,
        }
    }

    pub fn protected_patterns(&self) -> &[String] {
        &self.protected_files
    }

    pub fn delegate_command(&self) -> &[String] {
        &self.delegate_command
    }

    pub fn delegate_timeout(&self) -> Duration {
        self.delegate_timeout
    }

    pub fn tool_timeout(&self) -> Duration {
        self.tool_timeout
    }
}

/// Resolve the project root: `CLAUDE_PROJECT_DIR`, then the harness `cwd`,
/// then the process working directory.
pub fn project_root(cwd_hint: Option<&str>) -> PathBuf {
    if let Ok(dir) = std::env::var(PROJECT_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    if let Some(cwd) = cwd_hint.filter(|c| !c.trim().is_empty()) {
        return PathBuf::from(cwd);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Path of the policy document for a project root
pub fn config_path(root: &Path) -> PathBuf {
    match std::env::var(CONFIG_FILE_ENV) {
        Ok(custom) if !custom.trim().is_empty() => {
            let custom = PathBuf::from(custom);
            if custom.is_absolute() {
                custom
            } else {
                root.join(custom)
            }
        }
        _ => root.join(CONFIG_RELATIVE_PATH),
    }
}

/// Load the policy for a project root. Never fails: a missing, unreadable or
/// malformed document yields the defaults.
pub fn load(root: &Path) -> PolicyConfig {
    load_from_path(&config_path(root))
}

pub fn load_from_path(path: &Path) -> PolicyConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no policy file, using defaults");
            return PolicyConfig::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read policy file, using defaults");
            return PolicyConfig::default();
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(json) if json.is_object() => PolicyConfig::from_json(&json),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "policy file is not a JSON object, using defaults");
            PolicyConfig::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed policy file, using defaults");
            PolicyConfig::default()
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Array of strings; non-string elements are skipped. `None` when the value
/// is absent or not an array.
fn string_array(value: Option<&Value>) -> Option<Vec<String>> {
    let list = value?.as_array()?;
    Some(
        list.iter()
            .filter_map(|it| it.as_str())
            .map(|s| s.to_string())
            .collect(),
    )
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn positive_secs(value: Option<&Value>) -> Option<Duration> {
    value?
        .as_u64()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_cover_every_accessor() {
        let cfg = PolicyConfig::default();
        for tag in LanguageTag::KNOWN {
            assert!(cfg.is_language_enabled(tag));
        }
        assert!(cfg.exclusions().iter().any(|p| p == "**/node_modules/**"));
        assert!(cfg.is_auto_format_enabled());
        assert!(cfg.is_subprocess_enabled());
        assert!(cfg.allowed_subcommands("pip").is_empty());
        assert_eq!(cfg.enforced_manager(Ecosystem::Python), "uv");
        assert_eq!(cfg.enforced_manager(Ecosystem::JavaScript), "bun");
        assert!(cfg.protected_patterns().iter().any(|p| p == ".ruff.toml"));
        assert_eq!(cfg.delegate_command(), ["claude", "-p"]);
        assert_eq!(cfg.tool_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = PolicyConfig::from_json(&json!({
            "languages": {"python": false, "Markdown": false},
            "exclusions": ["**/generated/**"],
            "phases": {"auto_format": false, "subprocess_delegation": false},
            "package_managers": {
                "python": "pdm",
                "javascript": "pnpm",
                "allowed_subcommands": {"pip": ["list", "show"], "npm": ["run"]}
            },
            "protected_files": ["custom.cfg"],
            "delegate": {"command": ["fixer", "--stdin"], "timeout_secs": 12},
            "tools": {"timeout_secs": 5}
        }));
        assert!(!cfg.is_language_enabled(LanguageTag::Python));
        assert!(!cfg.is_language_enabled(LanguageTag::Markdown));
        assert!(cfg.is_language_enabled(LanguageTag::Shell));
        assert_eq!(cfg.exclusions(), ["**/generated/**"]);
        assert!(!cfg.is_auto_format_enabled());
        assert!(!cfg.is_subprocess_enabled());
        assert_eq!(cfg.allowed_subcommands("pip"), ["list", "show"]);
        assert_eq!(cfg.allowed_subcommands("npm"), ["run"]);
        assert_eq!(cfg.enforced_manager(Ecosystem::Python), "pdm");
        assert_eq!(cfg.enforced_manager(Ecosystem::JavaScript), "pnpm");
        assert_eq!(cfg.protected_patterns(), ["custom.cfg"]);
        assert_eq!(cfg.delegate_command(), ["fixer", "--stdin"]);
        assert_eq!(cfg.delegate_timeout(), Duration::from_secs(12));
        assert_eq!(cfg.tool_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn wrong_shapes_fall_back_to_defaults() {
        let cfg = PolicyConfig::from_json(&json!({
            "languages": {"python": "no", "shell": 0},
            "exclusions": "tests/*",
            "phases": {"auto_format": "false", "subprocess_delegation": null},
            "package_managers": {"python": 3, "allowed_subcommands": {"pip": "install"}},
            "protected_files": {"a": 1},
            "delegate": {"command": [], "timeout_secs": -4},
            "tools": {"timeout_secs": 0}
        }));
        let defaults = PolicyConfig::default();
        assert!(cfg.is_language_enabled(LanguageTag::Python));
        assert!(cfg.is_language_enabled(LanguageTag::Shell));
        assert_eq!(cfg.exclusions(), defaults.exclusions());
        assert!(cfg.is_auto_format_enabled());
        assert!(cfg.is_subprocess_enabled());
        assert_eq!(cfg.enforced_manager(Ecosystem::Python), "uv");
        assert!(cfg.allowed_subcommands("pip").is_empty());
        assert_eq!(cfg.protected_patterns(), defaults.protected_patterns());
        assert_eq!(cfg.delegate_command(), defaults.delegate_command());
        assert_eq!(cfg.delegate_timeout(), defaults.delegate_timeout());
        assert_eq!(cfg.tool_timeout(), defaults.tool_timeout());
    }

    #[test]
    fn mixed_arrays_keep_only_strings() {
        let cfg = PolicyConfig::from_json(&json!({"exclusions": ["a/**", 7, null, "b/**"]}));
        assert_eq!(cfg.exclusions(), ["a/**", "b/**"]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let td = tempfile::tempdir().unwrap();
        let cfg = load_from_path(&td.path().join("absent.json"));
        assert!(cfg.is_auto_format_enabled());
        assert!(cfg.allowed_subcommands("npm").is_empty());
    }

    #[test]
    fn malformed_and_non_object_files_yield_defaults() {
        let td = tempfile::tempdir().unwrap();
        let broken = td.path().join("broken.json");
        std::fs::write(&broken, "{ \"phases\": { \"auto_format\": false ").unwrap();
        assert!(load_from_path(&broken).is_auto_format_enabled());

        let array = td.path().join("array.json");
        std::fs::write(&array, "[1, 2, 3]").unwrap();
        assert!(load_from_path(&array).is_subprocess_enabled());
    }

    #[test]
    fn unreadable_path_yields_defaults() {
        // A directory cannot be read as a file
        let td = tempfile::tempdir().unwrap();
        let cfg = load_from_path(td.path());
        assert_eq!(cfg.enforced_manager(Ecosystem::JavaScript), "bun");
    }
}
