use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use policy_hooks::invocation::read_stdin;
use policy_hooks::security::check_and_revert;
use policy_hooks::tools::executor::until_signal;
use policy_hooks::vcs::Git;
use policy_hooks::{config, logging, Decision, HookInput};

const HOOK: &str = "stop";

#[derive(Debug, Parser)]
#[command(about = "Session-end check that reverts tampering with protected configuration")]
struct StopArgs {
    /// Repository root. Defaults to CLAUDE_PROJECT_DIR, the harness cwd, then
    /// the working directory.
    repo_root: Option<PathBuf>,
}

/// Root from the argument, else from the environment or the harness JSON
fn resolve_root(args: StopArgs) -> Result<PathBuf> {
    if let Some(root) = args.repo_root {
        return Ok(root);
    }

    let input = read_stdin()?;
    let cwd = if input.trim().is_empty() {
        None
    } else {
        match serde_json::from_str::<HookInput>(&input) {
            Ok(hook_input) => hook_input.cwd,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unparseable stop hook input");
                None
            }
        }
    };
    Ok(config::project_root(cwd.as_deref()))
}

async fn run(root: PathBuf) -> Decision {
    let policy = config::load(&root);
    tracing::debug!(root = %root.display(), "checking protected files");

    let git = Git::new(&root, policy.tool_timeout());
    check_and_revert(&git, &policy).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init_tracing();

    let root = match resolve_root(StopArgs::parse()) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("{HOOK}: {e:#}; skipping tamper check");
            return ExitCode::SUCCESS;
        }
    };

    match until_signal(run(root)).await {
        Ok(decision) => {
            decision.report(HOOK);
            ExitCode::from(decision.exit_code())
        }
        Err(signo) => {
            eprintln!("{HOOK}: interrupted by signal {signo}");
            ExitCode::from(u8::try_from(128 + signo).unwrap_or(u8::MAX))
        }
    }
}
