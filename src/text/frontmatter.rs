//! @acp:module "Frontmatter Tokenizer"
//! @acp:summary "Line-oriented parser for the flat key/list header of memory files"
//! @acp:domain cli
//! @acp:layer parser
//!
//! Grammar:
//!
//! ```text
//! ---
//! key: scalar
//! key: "quoted scalar"
//! key: [inline, list]
//! key:
//!   - list item
//!   - "another item"
//! ---
//! ```
//!
//! Blank lines and `#` comments are ignored. An unterminated block or a list
//! item with no owning key makes the whole header ambiguous, which yields an
//! empty mapping.

/// Block delimiter line
pub const DELIMITER: &str = "---";

/// Value of a frontmatter field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

/// Parsed frontmatter header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    present: bool,
    fields: Vec<(String, FieldValue)>,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Outside,
    Inside,
    InsideList(usize),
}

impl Frontmatter {
    /// @acp:summary "Parse the frontmatter block at the start of a document"
    pub fn parse(text: &str) -> Self {
        let mut state = State::Outside;
        let mut fields: Vec<(String, FieldValue)> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();

            if let State::Outside = state {
                if line.trim_end() != DELIMITER {
                    return Self::default();
                }
                state = State::Inside;
                continue;
            }

            if line.trim_end() == DELIMITER {
                return Self {
                    present: true,
                    fields,
                };
            }

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let State::InsideList(index) = state {
                if let Some(item) = list_item(trimmed) {
                    if let FieldValue::List(items) = &mut fields[index].1 {
                        items.push(unquote(item));
                    }
                    continue;
                }
                state = State::Inside;
            }

            if list_item(trimmed).is_some() {
                return Self::default();
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_string();
            let value = value.trim();

            let parsed = if value.is_empty() {
                FieldValue::List(Vec::new())
            } else if value.starts_with('[') {
                FieldValue::List(parse_inline_list(value))
            } else {
                FieldValue::Scalar(unquote(value))
            };
            let opens_list = value.is_empty();

            let index = match fields.iter().position(|(k, _)| *k == key) {
                Some(existing) => {
                    fields[existing].1 = parsed;
                    existing
                }
                None => {
                    fields.push((key, parsed));
                    fields.len() - 1
                }
            };
            if opens_list {
                state = State::InsideList(index);
            }
        }

        // Unterminated block
        Self::default()
    }

    /// Whether a delimited block was found
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Whether no fields were parsed
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a non-empty scalar field
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FieldValue::Scalar(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Glob filters declared under `paths`, in declaration order
    pub fn paths(&self) -> Vec<String> {
        match self.get("paths") {
            Some(FieldValue::List(items)) => {
                items.iter().filter(|s| !s.is_empty()).cloned().collect()
            }
            Some(FieldValue::Scalar(s)) => split_items(s)
                .into_iter()
                .map(|p| unquote(p.trim()))
                .filter(|p| !p.is_empty())
                .collect(),
            None => Vec::new(),
        }
    }
}

fn list_item(trimmed: &str) -> Option<&str> {
    trimmed.strip_prefix("- ").map(str::trim)
}

fn parse_inline_list(value: &str) -> Vec<String> {
    let inner = value.trim_start_matches('[').trim_end_matches(']').trim();
    if inner.is_empty() {
        return Vec::new();
    }
    split_items(inner).into_iter().map(|s| unquote(s.trim())).collect()
}

/// Split on commas that sit outside quotes and `{...}` groups
fn split_items(s: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                items.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&s[start..]);
    items
}

fn unquote(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_block_list() {
        let fm = Frontmatter::parse(
            "---\ndescription: API rules\npaths:\n  - \"src/api/**/*.ts\"\n  - 'lib/**'\n\n  # comment\n  - tests/*.rs\nalwaysApply: false\n---\n# Body\n",
        );
        assert!(fm.is_present());
        assert_eq!(fm.scalar("description"), Some("API rules"));
        assert_eq!(fm.paths(), vec!["src/api/**/*.ts", "lib/**", "tests/*.rs"]);
        assert_eq!(fm.scalar("alwaysApply"), Some("false"));
    }

    #[test]
    fn test_inline_and_scalar_paths() {
        let inline = Frontmatter::parse("---\npaths: [\"a/**\", b/*.md]\n---\n");
        assert_eq!(inline.paths(), vec!["a/**", "b/*.md"]);

        let scalar = Frontmatter::parse("---\npaths: src/**/*.rs, docs/*.md\n---\n");
        assert_eq!(scalar.paths(), vec!["src/**/*.rs", "docs/*.md"]);
    }

    #[test]
    fn test_commas_inside_braces_and_quotes() {
        let fm = Frontmatter::parse("---\npaths: [\"src/**/*.{ts,tsx}\", 'a,b.md', lib/**]\n---\n");
        assert_eq!(fm.paths(), vec!["src/**/*.{ts,tsx}", "a,b.md", "lib/**"]);

        let scalar = Frontmatter::parse("---\npaths: web/*.{js,css}, docs/*.md\n---\n");
        assert_eq!(scalar.paths(), vec!["web/*.{js,css}", "docs/*.md"]);
    }

    #[test]
    fn test_no_frontmatter() {
        let fm = Frontmatter::parse("# Title\n---\npaths:\n - x\n---\n");
        assert!(!fm.is_present());
        assert!(fm.paths().is_empty());
    }

    #[test]
    fn test_unterminated_block_is_empty() {
        let fm = Frontmatter::parse("---\npaths:\n  - src/**\n# Body without closing\n");
        assert!(!fm.is_present());
        assert!(fm.is_empty());
    }

    #[test]
    fn test_orphan_list_item_is_empty() {
        let fm = Frontmatter::parse("---\nname: x\n- stray\n---\n");
        assert!(fm.is_empty());
    }

    #[test]
    fn test_empty_paths_list() {
        let fm = Frontmatter::parse("---\npaths:\nname: rule\n---\n");
        assert!(fm.is_present());
        assert!(fm.paths().is_empty());
        assert_eq!(fm.scalar("name"), Some("rule"));
    }

    #[test]
    fn test_crlf_delimiters() {
        let fm = Frontmatter::parse("---\r\nname: skill\r\n---\r\nbody");
        assert_eq!(fm.scalar("name"), Some("skill"));
    }
}
