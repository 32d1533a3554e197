use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use policy_hooks::{config, logging, security, Decision, HookArgs};

const HOOK: &str = "pretooluse";

fn run(args: HookArgs) -> Result<Decision> {
    let invocation = args.into_invocation()?;
    let root = config::project_root(invocation.cwd.as_deref());
    let policy = config::load(&root);

    tracing::debug!(
        tool = invocation.tool.as_str(),
        root = %root.display(),
        "evaluating pre-tool-use policy"
    );
    Ok(security::evaluate_pre_tool_use(&policy, &invocation))
}

fn main() -> ExitCode {
    logging::init_tracing();
    let args = HookArgs::parse();

    match run(args) {
        Ok(decision) => {
            decision.report(HOOK);
            ExitCode::from(decision.exit_code())
        }
        Err(e) => {
            // Infrastructure failures never block the agent
            eprintln!("{HOOK}: {e:#}; allowing");
            ExitCode::SUCCESS
        }
    }
}
