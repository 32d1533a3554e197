//! Subprocess execution for external tools.
//!
//! Every child runs in its own process group. If the future waiting on a
//! child is dropped early (timeout, or the hook received SIGTERM/SIGINT and
//! abandoned its work), the whole group is killed so no formatter or fixer
//! is left orphaned.

use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::error::ToolError;

/// Captured result of a finished subprocess
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// First non-empty stderr line, falling back to stdout
    pub fn first_diagnostic_line(&self) -> Option<&str> {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
    }
}

/// One external command to run
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<OsString>,
    stdin: Option<String>,
    envs: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
    discard_output: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            envs: Vec::new(),
            current_dir: None,
            discard_output: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Send stdout/stderr to /dev/null instead of capturing them
    pub fn discard_output(mut self) -> Self {
        self.discard_output = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Runs invocations with a wall-clock bound
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run to completion. A missing binary maps to [`ToolError::NotFound`];
    /// a non-zero exit is *not* an error here, callers decide what it means.
    pub async fn run(&self, invocation: Invocation) -> Result<ToolOutput, ToolError> {
        let program = invocation.program.clone();
        let output_stdio = || {
            if invocation.discard_output {
                Stdio::null()
            } else {
                Stdio::piped()
            }
        };

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(if invocation.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(output_stdio())
            .stderr(output_stdio())
            .kill_on_drop(true);
        for (key, value) in &invocation.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ToolError::NotFound(program.clone()),
            _ => ToolError::Spawn { program: program.clone(), source },
        })?;
        let mut group = ProcessGroupGuard::new(child.id());
        tracing::debug!(program = %program, pid = ?child.id(), "spawned");

        if let (Some(input), Some(mut stdin)) = (invocation.stdin, child.stdin.take()) {
            // Write from a separate task so a child that fills its stdout
            // before draining stdin cannot deadlock us.
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    tracing::debug!(error = %e, "child closed stdin early");
                }
                let _ = stdin.shutdown().await;
            });
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ToolError::Io { program: program.clone(), source })?,
            Err(_elapsed) => {
                tracing::warn!(program = %program, timeout_secs = self.timeout.as_secs(), "tool timed out");
                // group guard kills the process group on return
                return Err(ToolError::Timeout { program, secs: self.timeout.as_secs() });
            }
        };
        group.disarm();

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Kills a child's process group unless disarmed after a normal exit
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        let Some(pgid) = self.pgid.take() else { return };
        #[cfg(unix)]
        {
            let Ok(pgid) = libc::pid_t::try_from(pgid) else { return };
            if pgid <= 1 {
                return;
            }
            // ESRCH just means the group is already gone
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
            tracing::debug!(pgid, "killed process group");
        }
        #[cfg(not(unix))]
        let _ = pgid;
    }
}

/// Drive `work` until it finishes or the process receives SIGTERM/SIGINT.
///
/// On a signal the work future is dropped, which kills every in-flight
/// process group, and `Err(signo)` is returned so the caller can exit with
/// `128 + signo`.
pub async fn until_signal<F: Future>(work: F) -> Result<F::Output, i32> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut term, mut int) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "cannot install signal handlers");
                return Ok(work.await);
            }
        };

        tokio::select! {
            out = work => Ok(out),
            _ = term.recv() => Err(libc::SIGTERM),
            _ = int.recv() => Err(libc::SIGINT),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            out = work => Ok(out),
            _ = tokio::signal::ctrl_c() => Err(2),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor() -> CommandExecutor {
        CommandExecutor::new(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let err = executor()
            .run(Invocation::new("definitely-not-a-real-command-12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref p) if p == "definitely-not-a-real-command-12345"));
    }

    #[tokio::test]
    async fn captures_exit_code_and_streams() {
        let out = executor()
            .run(Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.first_diagnostic_line(), Some("err"));
    }

    #[tokio::test]
    async fn feeds_stdin_and_env() {
        let out = executor()
            .run(
                Invocation::new("sh")
                    .args(["-c", "cat; printf '%s' \"$HOOK_TEST_VALUE\""])
                    .stdin("prompt text\n")
                    .env("HOOK_TEST_VALUE", "xyz"),
            )
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "prompt text\nxyz");
    }

    #[tokio::test]
    async fn timeout_is_typed() {
        let err = CommandExecutor::new(Duration::from_millis(200))
            .run(Invocation::new("sh").args(["-c", "sleep 5"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[tokio::test]
    async fn discarded_output_is_empty() {
        let out = executor()
            .run(Invocation::new("sh").args(["-c", "echo noisy"]).discard_output())
            .await
            .unwrap();
        assert!(out.success());
        assert!(out.stdout.is_empty());
    }

    #[tokio::test]
    async fn until_signal_passes_through_result() {
        let out = until_signal(async { 41 + 1 }).await;
        assert_eq!(out, Ok(42));
    }
}
