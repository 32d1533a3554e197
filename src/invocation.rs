use std::collections::HashMap;
use std::io::{IsTerminal, Read};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

/// Claude Code hook input data structure - the fields the hooks use
#[derive(Debug, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>, // Current working directory
    #[serde(default)]
    pub hook_event_name: Option<String>,
}

/// Tool the harness is about to run (or just ran)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    Write,
    Edit,
    MultiEdit,
    Bash,
    Other(String),
}

impl ToolKind {
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "Write" => ToolKind::Write,
            "Edit" => ToolKind::Edit,
            "MultiEdit" => ToolKind::MultiEdit,
            "Bash" => ToolKind::Bash,
            other => ToolKind::Other(other.to_string()),
        }
    }

    /// Tools that write or edit a file
    pub fn is_write_class(&self) -> bool {
        matches!(self, ToolKind::Write | ToolKind::Edit | ToolKind::MultiEdit)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Write => "Write",
            ToolKind::Edit => "Edit",
            ToolKind::MultiEdit => "MultiEdit",
            ToolKind::Bash => "Bash",
            ToolKind::Other(name) => name.as_str(),
        }
    }
}

/// One hook call: the tool and its primary argument (file path or command line)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInvocation {
    pub tool: ToolKind,
    pub payload: String,
    /// Working directory reported by the harness, if any
    pub cwd: Option<String>,
}

impl HookInvocation {
    pub fn new(tool_name: &str, payload: impl Into<String>) -> Self {
        Self { tool: ToolKind::parse(tool_name), payload: payload.into(), cwd: None }
    }

    /// Pick the payload out of the harness JSON: `file_path` for write-class
    /// tools, `command` for Bash.
    pub fn from_hook_input(input: &HookInput) -> Self {
        let tool = ToolKind::parse(&input.tool_name);
        let key = if tool == ToolKind::Bash { "command" } else { "file_path" };
        let payload = input
            .tool_input
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        Self { tool, payload, cwd: input.cwd.clone() }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let input: HookInput = serde_json::from_str(text).context("Failed to parse hook input")?;
        Ok(Self::from_hook_input(&input))
    }
}

/// Positional hook arguments. Without them the harness JSON is read from stdin.
#[derive(Debug, Parser)]
#[command(about = "Claude Code policy hook")]
pub struct HookArgs {
    /// Tool name (Write, Edit, MultiEdit, Bash, ...)
    pub tool_name: Option<String>,
    /// File path for write-class tools, command line for Bash
    #[arg(allow_hyphen_values = true)]
    pub payload: Option<String>,
}

impl HookArgs {
    pub fn into_invocation(self) -> Result<HookInvocation> {
        match self.tool_name {
            Some(tool_name) => Ok(HookInvocation::new(&tool_name, self.payload.unwrap_or_default())),
            None => {
                let input = read_stdin()?;
                if input.trim().is_empty() {
                    return Ok(HookInvocation::new("", ""));
                }
                HookInvocation::from_json(&input)
            }
        }
    }
}

/// Read stdin to the end; an interactive terminal yields an empty string
pub fn read_stdin() -> Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut input = String::new();
    stdin.read_to_string(&mut input).context("Failed to read stdin")?;
    Ok(input)
}
