use std::process::ExitCode;

use clap::Parser;

use policy_hooks::tools::executor::until_signal;
use policy_hooks::tools::ExternalTools;
use policy_hooks::validation::{LintPipeline, SubprocessDelegate};
use policy_hooks::{config, logging, Decision, HookArgs, HookInvocation};

const HOOK: &str = "posttooluse";

async fn run(invocation: HookInvocation) -> Decision {
    let root = config::project_root(invocation.cwd.as_deref());
    let policy = config::load(&root);
    tracing::debug!(
        tool = invocation.tool.as_str(),
        path = %invocation.payload,
        root = %root.display(),
        "running lint pipeline"
    );

    let runner = ExternalTools::new(policy.tool_timeout());
    let delegate = SubprocessDelegate::from_config(&policy).current_dir(&root);
    let pipeline = LintPipeline::new(&policy, &root, &runner, &delegate);

    pipeline.run(&invocation.tool, &invocation.payload).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init_tracing();

    let invocation = match HookArgs::parse().into_invocation() {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{HOOK}: {e:#}; allowing");
            return ExitCode::SUCCESS;
        }
    };

    match until_signal(run(invocation)).await {
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
