//! @acp:module "Git Lookup"
//! @acp:summary "Repository root discovery and ignore checks"
//! @acp:domain cli
//! @acp:layer io
//!
//! Uses in-process `git2` discovery. Any failure means "not in a repository";
//! callers never see a git error.

use std::path::{Path, PathBuf};

use git2::Repository;

/// Work tree root of the repository containing `path`, if any
pub fn find_repo_root(path: &Path) -> Option<PathBuf> {
    let repo = match Repository::discover(path) {
        Ok(repo) => repo,
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "No repository");
            return None;
        }
    };
    let workdir = repo.workdir()?;
    // workdir() carries a trailing separator; collecting components drops it
    let root: PathBuf = workdir.components().collect();
    Some(std::fs::canonicalize(&root).unwrap_or(root))
}

/// Whether git ignores `file`; `None` when `file` is not inside a repository
pub fn is_ignored(file: &Path) -> Option<bool> {
    let dir = file.parent()?;
    let repo = Repository::discover(dir).ok()?;
    let workdir = std::fs::canonicalize(repo.workdir()?).ok()?;
    let canonical = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    let relative = canonical.strip_prefix(&workdir).ok()?;
    repo.is_path_ignored(relative).ok()
}
