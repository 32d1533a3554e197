//! Version-control access for the session-end tamper check.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::tools::error::ToolError;
use crate::tools::executor::{CommandExecutor, Invocation, ToolOutput};

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("{0} is not a git work tree")]
    NotARepository(PathBuf),

    #[error("git {args} failed: {stderr}")]
    Git { args: String, stderr: String },

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// A path with pending changes, relative to the repository top level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPath {
    pub path: String,
    pub untracked: bool,
}

impl ChangedPath {
    pub fn tracked(path: impl Into<String>) -> Self {
        Self { path: path.into(), untracked: false }
    }

    pub fn untracked(path: impl Into<String>) -> Self {
        Self { path: path.into(), untracked: true }
    }
}

#[allow(async_fn_in_trait)]
pub trait VersionControl {
    async fn is_work_tree(&self) -> bool;

    /// Staged, unstaged and untracked paths
    async fn changed_paths(&self) -> Result<Vec<ChangedPath>, VcsError>;

    /// Discard every tracked change, back to the last commit
    async fn revert_all(&self) -> Result<(), VcsError>;

    /// Delete the given untracked paths
    async fn discard_untracked(&self, paths: &[String]) -> Result<(), VcsError>;
}

/// The `git` CLI, run against one work tree
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
    executor: CommandExecutor,
}

impl Git {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { root: root.into(), executor: CommandExecutor::new(timeout) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn git(&self, args: &[&str]) -> Result<ToolOutput, VcsError> {
        let invocation = Invocation::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0");
        let out = self.executor.run(invocation).await?;
        if out.success() {
            return Ok(out);
        }
        if out.stderr.contains("not a git repository") {
            return Err(VcsError::NotARepository(self.root.clone()));
        }
        Err(VcsError::Git { args: args.join(" "), stderr: out.stderr.trim().to_string() })
    }
}

impl VersionControl for Git {
    async fn is_work_tree(&self) -> bool {
        match self.git(&["rev-parse", "--is-inside-work-tree"]).await {
            Ok(out) => out.stdout.trim() == "true",
            Err(e) => {
                tracing::debug!(root = %self.root.display(), error = %e, "not a work tree");
                false
            }
        }
    }

    async fn changed_paths(&self) -> Result<Vec<ChangedPath>, VcsError> {
        let out = self.git(&["status", "--porcelain", "-z", "-uall"]).await?;
        Ok(parse_porcelain_z(&out.stdout))
    }

    async fn revert_all(&self) -> Result<(), VcsError> {
        self.git(&["reset", "--hard", "--quiet", "HEAD"]).await?;
        tracing::info!(root = %self.root.display(), "reset work tree to HEAD");
        Ok(())
    }

    async fn discard_untracked(&self, paths: &[String]) -> Result<(), VcsError> {
        if paths.is_empty() {
            return Ok(());
        }
        // status paths are relative to the top level, not to `root`
        let pathspecs: Vec<String> = paths.iter().map(|p| format!(":(top,literal){p}")).collect();
        let mut args = vec!["clean", "-f", "-q", "--"];
        args.extend(pathspecs.iter().map(String::as_str));
        self.git(&args).await?;
        Ok(())
    }
}

/// Parse `git status --porcelain -z` output. Rename and copy entries are
/// followed by their source path. A rename source has gone from the work
/// tree, so it is reported after the destination; a copy source is unchanged
/// and skipped.
pub fn parse_porcelain_z(output: &str) -> Vec<ChangedPath> {
    let mut changed = Vec::new();
    let mut entries = output.split('\0').filter(|e| !e.is_empty());

    while let Some(entry) = entries.next() {
        let (Some(status), Some(path)) = (entry.get(..2), entry.get(3..)) else {
            tracing::debug!(entry, "skipping malformed status entry");
            continue;
        };
        changed.push(ChangedPath { path: path.to_string(), untracked: status == "??" });

        let renamed = status.contains('R');
        if renamed || status.contains('C') {
            match entries.next() {
                Some(source) if renamed => changed.push(ChangedPath::tracked(source)),
                Some(_) => {}
                None => tracing::debug!(entry, "rename entry without a source path"),
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modified_untracked_and_renamed() {
        let raw = " M src/app.py\0M  ruff.toml\0?? notes/new file.md\0R  .ruff.toml\0old-ruff.toml\0D  gone.py\0";
        let changed = parse_porcelain_z(raw);
        assert_eq!(
            changed,
            vec![
                ChangedPath::tracked("src/app.py"),
                ChangedPath::tracked("ruff.toml"),
                ChangedPath::untracked("notes/new file.md"),
                ChangedPath::tracked(".ruff.toml"),
                ChangedPath::tracked("old-ruff.toml"),
                ChangedPath::tracked("gone.py"),
            ]
        );
    }

    #[test]
    fn rename_source_is_a_changed_path_but_copy_source_is_not() {
        let changed = parse_porcelain_z("R  ruff.toml.disabled\0ruff.toml\0C  lib2.py\0lib.py\0");
        assert_eq!(
            changed,
            vec![
                ChangedPath::tracked("ruff.toml.disabled"),
                ChangedPath::tracked("ruff.toml"),
                ChangedPath::tracked("lib2.py"),
            ]
        );
    }

    #[test]
    fn empty_status_is_clean() {
        assert!(parse_porcelain_z("").is_empty());
    }

    #[tokio::test]
    async fn plain_directory_is_not_a_work_tree() {
        let dir = tempfile::tempdir().unwrap();
        let git = Git::new(dir.path(), Duration::from_secs(10));
        assert!(!git.is_work_tree().await);
    }
}
