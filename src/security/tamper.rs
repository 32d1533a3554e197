//! Session-end check that protected configuration was left untouched.
//!
//! If any pending change touches a protected path, every working-tree change
//! is reverted to the last commit (all-or-nothing) and untracked protected
//! files are deleted, since `reset --hard` leaves them in place.

use crate::config::PolicyConfig;
use crate::decision::Decision;
use crate::security::protected_files::ProtectedMatcher;
use crate::vcs::VersionControl;

/// Detect and undo changes to protected paths.
///
/// A revert yields a warning, so the stop hook exits 2 and the harness keeps
/// the session going with the revert notice in front of the agent.
pub async fn check_and_revert<V: VersionControl>(vcs: &V, config: &PolicyConfig) -> Decision {
    if !vcs.is_work_tree().await {
        tracing::debug!("not a work tree, skipping tamper check");
        return Decision::allow();
    }

    let changed = match vcs.changed_paths().await {
        Ok(changed) => changed,
        Err(e) => {
            tracing::warn!(error = %e, "cannot list changed paths, skipping tamper check");
            return Decision::allow();
        }
    };
    if changed.is_empty() {
        return Decision::allow();
    }

    let matcher = ProtectedMatcher::from_config(config);
    let mut tampered = Vec::new();
    let mut patterns: Vec<&str> = Vec::new();
    for entry in &changed {
        if let Some(pattern) = matcher.matching_pattern(&entry.path) {
            tampered.push(entry);
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
    }
    if tampered.is_empty() {
        tracing::debug!(changed = changed.len(), "no protected paths changed");
        return Decision::allow();
    }

    let paths: Vec<&str> = tampered.iter().map(|c| c.path.as_str()).collect();
    tracing::warn!(paths = ?paths, patterns = ?patterns, "protected files modified, reverting");

    let mut decision = Decision::warn(format!(
        "Protected configuration files were modified: {} (matched {}). \
         All working-tree changes have been reverted to the last commit.",
        paths.join(", "),
        patterns.join(", ")
    ))
    .with_message(
        "Configuration files are immutable during a session. Fix violations in the code instead of changing lint or hook settings.",
    );

    if let Err(e) = vcs.revert_all().await {
        tracing::warn!(error = %e, "revert failed");
        decision = decision.with_message(format!("Revert failed: {e}"));
    }

    let untracked: Vec<String> = tampered.iter().filter(|c| c.untracked).map(|c| c.path.clone()).collect();
    if let Err(e) = vcs.discard_untracked(&untracked).await {
        tracing::warn!(error = %e, "removing untracked protected files failed");
        decision = decision.with_message(format!("Could not remove untracked protected files: {e}"));
    }

    decision
}
