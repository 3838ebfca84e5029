//! @acp:module "Reference Expander"
//! @acp:summary "Recursive expansion of @path references inside memory files"
//! @acp:domain cli
//! @acp:layer logic
//!
//! A memory file may pull in other files with `@relative/path.md` or
//! `@~/home/relative.md`. Tokens inside fenced code blocks and inline code
//! spans are inert. A token only becomes a reference when it names an
//! existing file, so e-mail addresses and decorators fall out naturally.
//!
//! Expansion is depth-first in source-line order, bounded by
//! [`MAX_REFERENCE_DEPTH`] and by a visited set of canonical locations shared
//! across the whole expansion of one source.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::{Settings, MAX_REFERENCE_DEPTH};
use crate::entry::{ConfigEntry, EntryKind, Sequence};
use crate::text;

/// @acp:summary "Expands @-references of a source into reference entries"
pub struct ReferenceExpander {
    home: PathBuf,
    token_pattern: Regex,
    code_span_pattern: Regex,
}

impl ReferenceExpander {
    /// @acp:summary "Create an expander anchored at the configured home"
    pub fn new(settings: &Settings) -> Self {
        Self {
            home: settings.home.clone(),
            token_pattern: Regex::new(r"@(~?[\w./_-]+)").unwrap(),
            code_span_pattern: Regex::new(r"`[^`]+`").unwrap(),
        }
    }

    /// @acp:summary "Expand a directly discovered source"
    ///
    /// The source itself is marked visited so a reference back to it is
    /// never emitted.
    pub fn expand_from(&self, source: &Path, seq: &mut Sequence) -> Vec<ConfigEntry> {
        let mut visited = HashSet::new();
        visited.insert(canonical(source));
        self.expand(source, 0, &mut visited, seq)
    }

    /// @acp:summary "Expand references of `source` found at `depth`"
    pub fn expand(
        &self,
        source: &Path,
        depth: usize,
        visited: &mut HashSet<PathBuf>,
        seq: &mut Sequence,
    ) -> Vec<ConfigEntry> {
        if depth >= MAX_REFERENCE_DEPTH {
            return Vec::new();
        }
        let Some(content) = text::read_text(source) else {
            return Vec::new();
        };
        let base_dir = source.parent().unwrap_or_else(|| Path::new("/"));

        let mut entries = Vec::new();
        for token in self.reference_tokens(&content) {
            let Some(target) = self.resolve_token(&token, base_dir) else {
                continue;
            };
            if !visited.insert(target.clone()) {
                continue;
            }

            tracing::trace!(from = %source.display(), to = %target.display(), depth, "Reference");
            let entry = ConfigEntry::new(target.clone(), EntryKind::Reference, seq.next_priority())
                .with_referrer(source);
            entries.push(entry);
            entries.extend(self.expand(&target, depth + 1, visited, seq));
        }

        entries
    }

    /// @acp:summary "Raw reference tokens outside code, in source order"
    pub fn reference_tokens(&self, content: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut in_fence = false;

        for line in content.lines() {
            if text::is_fence(line) {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            let without_spans = self.code_span_pattern.replace_all(line, "");
            for cap in self.token_pattern.captures_iter(&without_spans) {
                tokens.push(cap[1].to_string());
            }
        }

        tokens
    }

    /// Resolve a token to an existing file's canonical location
    fn resolve_token(&self, token: &str, base_dir: &Path) -> Option<PathBuf> {
        let candidate = self.candidate_path(token, base_dir)?;
        if candidate.is_file() {
            return std::fs::canonicalize(&candidate).ok();
        }
        // "See @docs/setup.md." at the end of a sentence
        let trimmed = token.trim_end_matches('.');
        if trimmed != token && !trimmed.is_empty() {
            let candidate = self.candidate_path(trimmed, base_dir)?;
            if candidate.is_file() {
                return std::fs::canonicalize(&candidate).ok();
            }
        }
        None
    }

    fn candidate_path(&self, token: &str, base_dir: &Path) -> Option<PathBuf> {
        if token == "~" {
            return Some(self.home.clone());
        }
        if let Some(rest) = token.strip_prefix("~/") {
            return Some(self.home.join(rest));
        }
        if token.starts_with('~') {
            // ~otheruser paths are not resolved
            return None;
        }
        Some(base_dir.join(token))
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
