use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Compiled exclusion patterns. A path is excluded when any pattern matches.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    set: GlobSet,
    len: usize,
}

impl ExclusionSet {
    /// Compile shell-style globs. Invalid patterns are skipped with a warning.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut len = 0;
        for pat in patterns {
            let pat = pat.as_ref().trim();
            if pat.is_empty() {
                continue;
            }
            match Glob::new(pat) {
                Ok(glob) => {
                    builder.add(glob);
                    len += 1;
                }
                Err(e) => tracing::warn!(pattern = pat, error = %e, "ignoring invalid exclusion pattern"),
            }
        }
        let set = builder.build().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cannot compile exclusion patterns");
            GlobSet::empty()
        });
        Self { set, len }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_match(&self, path: &Path) -> bool {
        if self.is_empty() {
            return false;
        }
        let normalized = path.to_string_lossy().replace('\\', "/");
        self.set.is_match(Path::new(&normalized))
    }

    /// Match a path under `root` by its root-relative form only, so the
    /// directories above the project never count. Paths outside `root`
    /// are matched as given.
    pub fn is_excluded_under(&self, root: &Path, path: &Path) -> bool {
        match path.strip_prefix(root) {
            Ok(relative) if relative.as_os_str().is_empty() => false,
            Ok(relative) => self.is_match(relative),
            Err(_) => self.is_match(path),
        }
    }
}

/// True when `path` matches any of the glob `patterns`
pub fn is_excluded<S: AsRef<str>>(path: impl AsRef<Path>, patterns: &[S]) -> bool {
    ExclusionSet::new(patterns).is_match(path.as_ref())
}
