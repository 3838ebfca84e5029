//! @acp:module "Text Inspector"
//! @acp:summary "Best-effort line, size, header and frontmatter inspection of memory files"
//! @acp:domain cli
//! @acp:layer io
//!
//! Every function here degrades to an empty or zero value when the file
//! cannot be read. A single unreadable source must never abort resolution.

pub mod frontmatter;

pub use frontmatter::{FieldValue, Frontmatter};

use std::path::Path;

/// Fenced code block delimiter
pub const FENCE: &str = "```";

/// A markdown section header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Number of leading `#` characters
    pub level: usize,
    /// Lowercased, trimmed header text
    pub title: String,
}

/// Read a file as text, replacing invalid UTF-8
pub fn read_text(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Unreadable source");
            None
        }
    }
}

/// Number of lines in a file, 0 if unreadable
pub fn line_count(path: &Path) -> usize {
    read_text(path).map(|t| t.lines().count()).unwrap_or(0)
}

/// Number of characters in a file, 0 if unreadable
pub fn char_size(path: &Path) -> usize {
    read_text(path).map(|t| t.chars().count()).unwrap_or(0)
}

/// Frontmatter of a file, empty if unreadable or malformed
pub fn frontmatter(path: &Path) -> Frontmatter {
    read_text(path)
        .map(|t| Frontmatter::parse(&t))
        .unwrap_or_default()
}

/// Display form of a path with the home prefix replaced by `~`
pub fn short_path(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

/// Whether a trimmed line opens or closes a fenced code block
pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with(FENCE)
}

/// Extract markdown headers outside fenced code blocks
pub fn section_headers(text: &str) -> Vec<Header> {
    let mut headers = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || !line.starts_with('#') {
            continue;
        }

        let level = line.chars().take_while(|c| *c == '#').count();
        let rest = &line[level..];
        // "#tag" is not a header
        if !rest.is_empty() && !rest.starts_with(' ') {
            continue;
        }
        let title = rest.trim().to_lowercase();
        if !title.is_empty() {
            headers.push(Header { level, title });
        }
    }

    headers
}
