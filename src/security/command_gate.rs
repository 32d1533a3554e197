//! Package-manager policy for shell commands.
//!
//! Legacy managers (`pip`, `npm`) are allowed only for allow-listed
//! subcommands. Superseded managers (`yarn`, `pnpm`, `poetry`, `pipenv`,
//! `conda`) are always refused. The project's enforced manager for an
//! ecosystem is never refused, whichever name it has.

use crate::config::{Ecosystem, PolicyConfig};
use crate::decision::Decision;
use crate::invocation::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerRule {
    /// Permitted for subcommands listed under `allowed_subcommands.<key>`
    Legacy { allow_key: &'static str },
    Superseded,
}

fn rule_for(program: &str) -> Option<(Ecosystem, ManagerRule)> {
    let rule = match program {
        "pip" | "pip3" => (Ecosystem::Python, ManagerRule::Legacy { allow_key: "pip" }),
        "npm" => (Ecosystem::JavaScript, ManagerRule::Legacy { allow_key: "npm" }),
        "yarn" | "pnpm" => (Ecosystem::JavaScript, ManagerRule::Superseded),
        "poetry" | "pipenv" | "conda" => (Ecosystem::Python, ManagerRule::Superseded),
        _ => return None,
    };
    Some(rule)
}

/// Executable and arguments of one simple command
#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandHead {
    program: String,
    args: Vec<String>,
}

impl CommandHead {
    fn subcommand(&self) -> Option<&str> {
        self.args.iter().map(String::as_str).find(|a| !a.starts_with('-'))
    }
}

/// Evaluate a Bash command line. Every segment of a compound command is
/// checked and the strictest decision wins.
pub fn evaluate(config: &PolicyConfig, tool: &ToolKind, command_line: &str) -> Decision {
    if *tool != ToolKind::Bash {
        return Decision::allow();
    }

    split_segments(command_line)
        .into_iter()
        .filter_map(|segment| command_head(&tokenize(segment)))
        .map(|head| evaluate_head(config, &head))
        .fold(Decision::allow(), Decision::merge)
}

fn evaluate_head(config: &PolicyConfig, head: &CommandHead) -> Decision {
    let Some((ecosystem, rule)) = rule_for(&head.program) else {
        return Decision::allow();
    };
    let enforced = config.enforced_manager(ecosystem);
    if head.program == enforced {
        return Decision::allow();
    }

    match rule {
        ManagerRule::Superseded => {
            tracing::info!(program = %head.program, enforced, "blocked superseded package manager");
            Decision::block(format!(
                "Blocked: `{}` is not used in this project. Use `{enforced}` for {} dependencies instead.",
                head.program,
                ecosystem.as_str()
            ))
        }
        ManagerRule::Legacy { allow_key } => {
            // bare `pip` / `npm --version` manage nothing
            let Some(subcommand) = head.subcommand() else {
                return Decision::allow();
            };
            let allowed = config.allowed_subcommands(allow_key);
            if allowed.iter().any(|s| s == subcommand) {
                return Decision::allow();
            }
            tracing::info!(program = %head.program, subcommand, enforced, "blocked legacy package manager");
            let permitted = if allowed.is_empty() { "none".to_string() } else { allowed.join(", ") };
            Decision::block(format!(
                "Blocked: `{} {subcommand}` is not allowed. Use `{enforced}` to manage {} dependencies \
                 (allowed {allow_key} subcommands: {permitted}).",
                head.program,
                ecosystem.as_str()
            ))
        }
    }
}

/// Split on `&&`, `||`, `;`, `|` and newlines outside of quotes
fn split_segments(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => escaped = true,
            (Some('"'), '"') => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ';' | '\n') => {
                segments.push(&line[start..i]);
                start = i + 1;
            }
            (None, '|') => {
                segments.push(&line[start..i]);
                start = i + 1;
                if matches!(chars.peek(), Some(&(_, '|'))) {
                    chars.next();
                    start += 1;
                }
            }
            (None, '&') if matches!(chars.peek(), Some(&(_, '&'))) => {
                chars.next();
                segments.push(&line[start..i]);
                start = i + 2;
            }
            _ => {}
        }
    }
    segments.push(&line[start..]);

    segments
        .into_iter()
        .map(|s| s.trim().trim_start_matches('(').trim_start())
        .filter(|s| !s.is_empty())
        .collect()
}

fn tokenize(segment: &str) -> Vec<String> {
    shlex::split(segment).unwrap_or_else(|| segment.split_whitespace().map(str::to_string).collect())
}

/// Skip `VAR=value` prefixes and `sudo`/`env`-style wrappers, then resolve
/// `python -m pip` to `pip`.
fn command_head(tokens: &[String]) -> Option<CommandHead> {
    let mut rest = tokens;
    loop {
        let (first, tail) = rest.split_first()?;
        if is_assignment(first) {
            rest = tail;
            continue;
        }
        match basename(first) {
            "sudo" => rest = skip_options(tail, &["-u", "-g", "-C", "-D", "-p", "-U"]),
            "env" => rest = skip_options(tail, &["-u", "-C"]),
            "command" | "exec" | "nohup" | "time" => rest = skip_options(tail, &[]),
            program if program.starts_with("python") => {
                return Some(python_module(program, tail));
            }
            program => {
                return Some(CommandHead { program: program.to_string(), args: tail.to_vec() });
            }
        }
    }
}

fn python_module(program: &str, args: &[String]) -> CommandHead {
    for (i, arg) in args.iter().enumerate() {
        if arg == "-m" {
            if let Some(module) = args.get(i + 1) {
                if module == "pip" || module == "pip3" {
                    return CommandHead { program: "pip".to_string(), args: args[i + 2..].to_vec() };
                }
            }
            break;
        }
        if !arg.starts_with('-') {
            break;
        }
    }
    CommandHead { program: program.to_string(), args: args.to_vec() }
}

fn skip_options<'a>(mut tokens: &'a [String], takes_value: &[&str]) -> &'a [String] {
    while let Some((first, tail)) = tokens.split_first() {
        if first == "--" {
            return tail;
        }
        if !first.starts_with('-') {
            break;
        }
        tokens = if takes_value.contains(&first.as_str()) { tail.get(1..).unwrap_or(&[]) } else { tail };
    }
    tokens
}

fn is_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn basename(program: &str) -> &str {
    program.rsplit('/').next().unwrap_or(program)
}
