//! @acp:module "Rule Globs"
//! @acp:summary "Match rule path filters against the files under a directory"
//! @acp:domain cli
//! @acp:layer logic
//!
//! Filters use the `glob` crate dialect: `*` and `?` stay inside one path
//! component, `**` spans any number of directories, `[...]` is a character
//! class. One extension on top: `{a,b}` alternatives are expanded before
//! matching. Filters are relative to the directory; a leading `./` or `/` is
//! ignored.

use std::path::Path;

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::config::GIT_DIR;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Expand `{a,b}` alternatives into separate patterns
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|i| open + i) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    pattern[open + 1..close]
        .split(',')
        .flat_map(|alt| expand_braces(&format!("{prefix}{alt}{suffix}")))
        .collect()
}

/// @acp:summary "Relative paths below a directory, scanned once per audit"
pub struct PathIndex {
    paths: Vec<String>,
}

impl PathIndex {
    /// Collect every file and directory below `root`, skipping `.git`
    pub fn scan(root: &Path) -> Self {
        let paths = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != GIT_DIR)
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                e.path()
                    .strip_prefix(root)
                    .ok()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        Self { paths }
    }

    /// Whether `filter` matches at least one path.
    ///
    /// A filter that is not a valid glob counts as live; it cannot be judged.
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.trim_start_matches("./").trim_start_matches('/');
        for alternative in expand_braces(filter) {
            let pattern = match Pattern::new(&alternative) {
                Ok(pattern) => pattern,
                Err(e) => {
                    tracing::warn!(filter = %alternative, error = %e, "Invalid path filter");
                    return true;
                }
            };
            if self
                .paths
                .iter()
                .any(|p| pattern.matches_with(p, MATCH_OPTIONS))
            {
                return true;
            }
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
