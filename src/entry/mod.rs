//! @acp:module "Config Entry"
//! @acp:summary "Resolved configuration sources and the kind lookup table"
//! @acp:domain cli
//! @acp:layer model
//!
//! Each [`EntryKind`] maps to one row of a static table holding its display
//! label, its two-character marker and its loading class. Adding a kind means
//! adding a variant and a row.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::text;

/// @acp:summary "Kind of configuration source"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Managed,
    User,
    UserRule,
    AutoMemory,
    AutoMemoryTopic,
    Project,
    ProjectRule,
    Local,
    Child,
    Reference,
    Skill,
}

/// When a source's content enters the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadClass {
    /// Loaded at session start (possibly gated by path filters)
    Startup,
    /// Detected but only read when the assistant visits that area
    OnDemand,
    /// Skill definition, loaded when invoked
    Skill,
}

/// Static per-kind metadata
#[derive(Debug)]
pub struct KindInfo {
    pub kind: EntryKind,
    pub name: &'static str,
    pub label: &'static str,
    pub marker: &'static str,
    pub load: LoadClass,
}

#[rustfmt::skip]
static KIND_TABLE: [KindInfo; 11] = [
    KindInfo { kind: EntryKind::Managed, name: "managed", label: "Managed Policy", marker: "!!", load: LoadClass::Startup },
    KindInfo { kind: EntryKind::User, name: "user", label: "User Memory", marker: "~~", load: LoadClass::Startup },
    KindInfo { kind: EntryKind::UserRule, name: "user_rule", label: "User Rule", marker: "~r", load: LoadClass::Startup },
    KindInfo { kind: EntryKind::AutoMemory, name: "auto_memory", label: "Auto Memory", marker: "am", load: LoadClass::Startup },
    KindInfo { kind: EntryKind::AutoMemoryTopic, name: "auto_memory_topic", label: "Auto Topic (on-demand)", marker: "at", load: LoadClass::OnDemand },
    KindInfo { kind: EntryKind::Project, name: "project", label: "Project", marker: ">>", load: LoadClass::Startup },
    KindInfo { kind: EntryKind::ProjectRule, name: "project_rule", label: "Project Rule", marker: "pr", load: LoadClass::Startup },
    KindInfo { kind: EntryKind::Local, name: "local", label: "Local", marker: "**", load: LoadClass::Startup },
    KindInfo { kind: EntryKind::Child, name: "child", label: "Child (on-demand)", marker: "..", load: LoadClass::OnDemand },
    KindInfo { kind: EntryKind::Reference, name: "reference", label: "Reference (@)", marker: "@@", load: LoadClass::Startup },
    KindInfo { kind: EntryKind::Skill, name: "skill", label: "Skill (on-demand)", marker: "sk", load: LoadClass::Skill },
];

impl EntryKind {
    /// Table row for this kind
    pub fn info(self) -> &'static KindInfo {
        &KIND_TABLE[self as usize]
    }

    /// Snake-case name, as serialized
    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn marker(self) -> &'static str {
        self.info().marker
    }

    pub fn load(self) -> LoadClass {
        self.info().load
    }

    /// Rule files carry frontmatter path filters
    pub fn is_rule(self) -> bool {
        matches!(self, EntryKind::UserRule | EntryKind::ProjectRule)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display group used by the human renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Always,
    Conditional,
    OnDemand,
    Skills,
}

impl Group {
    pub const ALL: [Group; 4] = [Group::Always, Group::Conditional, Group::OnDemand, Group::Skills];

    pub fn title(self) -> &'static str {
        match self {
            Group::Always => "Always loaded",
            Group::Conditional => "Conditional (path-scoped)",
            Group::OnDemand => "On-demand (loaded when needed)",
            Group::Skills => "Skills",
        }
    }
}

/// Sequential priority source shared by everything that emits entries
#[derive(Debug, Default)]
pub struct Sequence(usize);

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next priority, starting at 1
    pub fn next_priority(&mut self) -> usize {
        self.0 += 1;
        self.0
    }
}

/// @acp:summary "One resolved configuration source"
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    /// Canonical location, the deduplication key
    pub location: PathBuf,
    pub kind: EntryKind,
    /// Discovery order, lower wins
    pub priority: usize,
    pub total_lines: usize,
    pub loaded_lines: usize,
    pub conditional: bool,
    pub path_filters: Vec<String>,
    /// Location of the file whose `@` token pulled this entry in
    pub referenced_from: Option<PathBuf>,
    size: OnceCell<usize>,
}

impl PartialEq for ConfigEntry {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
            && self.kind == other.kind
            && self.priority == other.priority
            && self.total_lines == other.total_lines
            && self.loaded_lines == other.loaded_lines
            && self.conditional == other.conditional
            && self.path_filters == other.path_filters
            && self.referenced_from == other.referenced_from
    }
}

impl Eq for ConfigEntry {}

impl ConfigEntry {
    /// @acp:summary "Create an entry, counting lines now and deferring size"
    pub fn new(location: PathBuf, kind: EntryKind, priority: usize) -> Self {
        let total_lines = text::line_count(&location);
        let loaded_lines = match kind.load() {
            LoadClass::Startup => total_lines,
            LoadClass::OnDemand | LoadClass::Skill => 0,
        };
        Self {
            location,
            kind,
            priority,
            total_lines,
            loaded_lines,
            conditional: false,
            path_filters: Vec::new(),
            referenced_from: None,
            size: OnceCell::new(),
        }
    }

    /// Attach frontmatter path filters; non-empty filters make the entry conditional
    pub fn with_path_filters(mut self, filters: Vec<String>) -> Self {
        self.conditional = !filters.is_empty();
        self.path_filters = filters;
        self
    }

    /// Cap the loaded line count
    pub fn with_line_cap(mut self, cap: usize) -> Self {
        self.loaded_lines = self.total_lines.min(cap);
        self
    }

    pub fn with_referrer(mut self, referrer: &Path) -> Self {
        self.referenced_from = Some(referrer.to_path_buf());
        self
    }

    /// Character size of the underlying file, computed on first use
    pub fn size_chars(&self) -> usize {
        *self.size.get_or_init(|| text::char_size(&self.location))
    }

    /// Counted against the startup budget (always or conditional)
    pub fn is_startup(&self) -> bool {
        self.kind.load() == LoadClass::Startup
    }

    /// Loaded at startup regardless of which files are touched
    pub fn is_always_loaded(&self) -> bool {
        self.is_startup() && !self.conditional
    }

    pub fn group(&self) -> Group {
        match self.kind.load() {
            LoadClass::Startup if self.conditional => Group::Conditional,
            LoadClass::Startup => Group::Always,
            LoadClass::OnDemand => Group::OnDemand,
            LoadClass::Skill => Group::Skills,
        }
    }

    pub fn file_name(&self) -> String {
        self.location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// "40 lines" or "200/512 lines" when capped
    pub fn size_display(&self) -> String {
        if self.loaded_lines > 0 && self.loaded_lines != self.total_lines {
            format!("{}/{} lines", self.loaded_lines, self.total_lines)
        } else {
            format!("{} lines", self.total_lines)
        }
    }

    /// @acp:summary "Machine-readable projection of this entry"
    pub fn to_record(&self) -> EntryRecord {
        EntryRecord {
            path: self.location.to_string_lossy().into_owned(),
            kind: self.kind,
            priority: self.priority,
            lines: self.total_lines,
            loaded_lines: self.loaded_lines,
            conditional: self.conditional,
            paths_filter: self.path_filters.clone(),
            referenced_from: self
                .referenced_from
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            size_chars: self.size_chars(),
        }
    }
}

/// @acp:summary "Serialized entry for JSON output"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub path: String,
    pub kind: EntryKind,
    pub priority: usize,
    pub lines: usize,
    pub loaded_lines: usize,
    pub conditional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths_filter: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_from: Option<String>,
    pub size_chars: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_table_rows_match_variants() {
        let kinds = [
            EntryKind::Managed,
            EntryKind::User,
            EntryKind::UserRule,
            EntryKind::AutoMemory,
            EntryKind::AutoMemoryTopic,
            EntryKind::Project,
            EntryKind::ProjectRule,
            EntryKind::Local,
            EntryKind::Child,
            EntryKind::Reference,
            EntryKind::Skill,
        ];
        for kind in kinds {
            assert_eq!(kind.info().kind, kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_on_demand_kinds_load_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("topic.md");
        std::fs::write(&path, "a\nb\nc\n").unwrap();

        let topic = ConfigEntry::new(path.clone(), EntryKind::AutoMemoryTopic, 1);
        assert_eq!(topic.total_lines, 3);
        assert_eq!(topic.loaded_lines, 0);
        assert_eq!(topic.group(), Group::OnDemand);

        let reference = ConfigEntry::new(path, EntryKind::Reference, 2);
        assert_eq!(reference.loaded_lines, 3);
        assert_eq!(reference.group(), Group::Always);
    }

    #[test]
    fn test_line_cap_and_display() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("MEMORY.md");
        std::fs::write(&path, "line\n".repeat(500)).unwrap();

        let entry = ConfigEntry::new(path, EntryKind::AutoMemory, 1).with_line_cap(200);
        assert_eq!(entry.total_lines, 500);
        assert_eq!(entry.loaded_lines, 200);
        assert_eq!(entry.size_display(), "200/500 lines");
    }

    #[test]
    fn test_filters_make_conditional() {
        let entry = ConfigEntry::new(PathBuf::from("/missing/rule.md"), EntryKind::ProjectRule, 1)
            .with_path_filters(vec!["src/**/*.rs".into()]);
        assert!(entry.conditional);
        assert_eq!(entry.group(), Group::Conditional);
        assert!(!entry.is_always_loaded());
        assert_eq!(entry.size_chars(), 0);
    }

    #[test]
    fn test_record_skips_empty_optionals() {
        let entry = ConfigEntry::new(PathBuf::from("/missing/CLAUDE.md"), EntryKind::Project, 3);
        let json = serde_json::to_value(entry.to_record()).unwrap();
        assert_eq!(json["kind"], "project");
        assert_eq!(json["priority"], 3);
        assert!(json.get("referenced_from").is_none());
        assert!(json.get("paths_filter").is_none());
    }
}
