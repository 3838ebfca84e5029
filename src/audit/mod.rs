//! @acp:module "Analyzer"
//! @acp:summary "Budget accounting and structural diagnostics over a resolved memory map"
//! @acp:domain cli
//! @acp:layer service
//!
//! Each rule is independent and reads only the entry list and the target
//! directory. Hints come out in rule order, not by severity. When no rule
//! fires a single [`HintKind::Ok`] hint is returned.

pub mod budget;
pub mod globs;
pub mod skills;

pub use budget::{summarize, BudgetSummary};
pub use globs::{expand_braces, PathIndex};

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{Settings, AUTO_MEMORY_LIMIT, CONFIG_DIR, LOCAL_FILE, PROJECT_FILE, RULES_DIR};
use crate::entry::{ConfigEntry, EntryKind};
use crate::git;
use crate::resolve;
use crate::text;

/// Rule file stems that say nothing about their content
pub const GENERIC_RULE_NAMES: &[&str] = &[
    "rules", "general", "misc", "other", "notes", "stuff", "temp", "untitled", "new", "default",
];

/// Header keywords for a project-structure section
const STRUCTURE_TOPICS: &[&str] = &["structure", "layout", "architecture"];

/// Header keywords for a commands section
const COMMAND_TOPICS: &[&str] = &["command", "usage", "scripts"];

/// @acp:summary "Category of a diagnostic"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    BrokenLink,
    OverBudget,
    BudgetRisk,
    Large,
    Unconditional,
    DeadRule,
    HierarchyGap,
    MissingSection,
    Duplicate,
    LocalNotIgnored,
    AutoMemoryOverflow,
    GenericName,
    Skill,
    NoAutoMemory,
    Ok,
}

impl HintKind {
    /// Upper-case label shown before the message
    pub fn label(self) -> &'static str {
        match self {
            HintKind::BrokenLink => "BROKEN LINK",
            HintKind::OverBudget => "OVER BUDGET",
            HintKind::BudgetRisk => "BUDGET RISK",
            HintKind::Large => "LARGE",
            HintKind::Unconditional => "UNCONDITIONAL",
            HintKind::DeadRule => "DEAD RULE",
            HintKind::HierarchyGap => "HIERARCHY GAP",
            HintKind::MissingSection => "MISSING SECTION",
            HintKind::Duplicate => "DUPLICATE",
            HintKind::LocalNotIgnored => "LOCAL NOT IGNORED",
            HintKind::AutoMemoryOverflow => "AUTO-MEMORY OVERFLOW",
            HintKind::GenericName => "GENERIC NAME",
            HintKind::Skill => "SKILL",
            HintKind::NoAutoMemory => "NO AUTO-MEMORY",
            HintKind::Ok => "OK",
        }
    }
}

/// @acp:summary "One diagnostic finding"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub kind: HintKind,
    pub message: String,
}

impl Hint {
    pub fn new(kind: HintKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

/// @acp:summary "Runs every diagnostic rule over a resolved entry list"
pub struct Analyzer {
    settings: Settings,
}

impl Analyzer {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// @acp:summary "Evaluate all rules in order"
    pub fn run(&self, entries: &[ConfigEntry], target: &Path) -> Vec<Hint> {
        let canonical = std::fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());
        let target = canonical.as_path();
        let mut hints = Vec::new();

        hints.extend(self.broken_links(entries, target));
        hints.extend(self.budget(entries));
        hints.extend(self.large_files(entries));
        hints.extend(self.unconditional_rules(entries));
        hints.extend(self.dead_rules(entries, target));
        hints.extend(self.hierarchy_gaps(target));
        hints.extend(self.missing_sections(target));
        hints.extend(self.duplicate_sections(entries));
        hints.extend(self.local_not_ignored(target));
        hints.extend(self.auto_memory_overflow(entries));
        hints.extend(self.generic_names(entries));
        hints.extend(skills::check(entries, target, &self.settings));
        if !entries.iter().any(|e| e.kind == EntryKind::AutoMemory) {
            hints.push(Hint::new(
                HintKind::NoAutoMemory,
                "consider enabling auto-memory for cross-session learning",
            ));
        }

        if hints.is_empty() {
            hints.push(Hint::new(HintKind::Ok, "no issues found"));
        }
        tracing::debug!(dir = %target.display(), hints = hints.len(), "Audit complete");
        hints
    }

    pub fn summarize(&self, entries: &[ConfigEntry]) -> BudgetSummary {
        summarize(entries, self.settings.budget_chars)
    }

    fn short(&self, path: &Path) -> String {
        text::short_path(path, &self.settings.home)
    }

    /// Every location the resolver would have looked at, links not followed
    fn broken_links(&self, entries: &[ConfigEntry], target: &Path) -> Vec<Hint> {
        let mut candidates: Vec<PathBuf> = entries.iter().map(|e| e.location.clone()).collect();
        candidates.push(self.settings.managed_policy.clone());
        candidates.push(self.settings.user_memory());
        candidates.extend(resolve::rule_paths(&self.settings.user_rules(), false));
        for level in resolve::hierarchy(target) {
            let config_dir = level.join(CONFIG_DIR);
            candidates.push(level.join(PROJECT_FILE));
            candidates.push(level.join(LOCAL_FILE));
            candidates.push(config_dir.join(PROJECT_FILE));
            candidates.extend(resolve::rule_paths(&config_dir.join(RULES_DIR), false));
        }

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .filter(|p| is_dangling(p))
            .map(|p| {
                let points_to = std::fs::read_link(&p)
                    .map(|t| t.display().to_string())
                    .unwrap_or_default();
                Hint::new(
                    HintKind::BrokenLink,
                    format!("{} -> {} (target missing)", self.short(&p), points_to),
                )
            })
            .collect()
    }

    fn budget(&self, entries: &[ConfigEntry]) -> Option<Hint> {
        let summary = self.summarize(entries);
        if summary.is_over() {
            Some(Hint::new(
                HintKind::OverBudget,
                format!(
                    "{} chars always loaded ({}% of {}); move sections into conditional rules",
                    summary.base, summary.base_pct, summary.budget
                ),
            ))
        } else if summary.is_at_risk() {
            Some(Hint::new(
                HintKind::BudgetRisk,
                format!(
                    "{} chars if every conditional rule loads ({}% of {})",
                    summary.max, summary.max_pct, summary.budget
                ),
            ))
        } else {
            None
        }
    }

    fn large_files(&self, entries: &[ConfigEntry]) -> Vec<Hint> {
        entries
            .iter()
            .filter(|e| e.is_startup())
            .filter(|e| {
                e.total_lines > self.settings.large_file_lines
                    || e.size_chars() > self.settings.large_file_chars
            })
            .map(|e| {
                Hint::new(
                    HintKind::Large,
                    format!(
                        "{} ({} lines, {} chars); consider splitting into .claude/rules/",
                        self.short(&e.location),
                        e.total_lines,
                        e.size_chars()
                    ),
                )
            })
            .collect()
    }

    fn unconditional_rules(&self, entries: &[ConfigEntry]) -> Vec<Hint> {
        entries
            .iter()
            .filter(|e| e.kind == EntryKind::ProjectRule && !e.conditional)
            .filter(|e| e.total_lines > self.settings.unconditional_rule_lines)
            .map(|e| {
                Hint::new(
                    HintKind::Unconditional,
                    format!(
                        "{} ({} lines); add paths: frontmatter to make it conditional",
                        self.short(&e.location),
                        e.total_lines
                    ),
                )
            })
            .collect()
    }

    fn dead_rules(&self, entries: &[ConfigEntry], target: &Path) -> Vec<Hint> {
        let conditional: Vec<&ConfigEntry> = entries.iter().filter(|e| e.conditional).collect();
        if conditional.is_empty() {
            return Vec::new();
        }

        let index = PathIndex::scan(target);
        conditional
            .into_iter()
            .filter(|e| !e.path_filters.iter().any(|f| index.matches(f)))
            .map(|e| {
                Hint::new(
                    HintKind::DeadRule,
                    format!(
                        "{} paths [{}] match nothing in {}",
                        self.short(&e.location),
                        e.path_filters.join(", "),
                        self.short(target)
                    ),
                )
            })
            .collect()
    }

    fn hierarchy_gaps(&self, target: &Path) -> Vec<Hint> {
        let top = git::find_repo_root(target).unwrap_or_else(|| target.to_path_buf());
        let mut hints = Vec::new();

        for dir in target.ancestors() {
            if !has_project_file(dir) {
                let children = self.children_with_project_file(dir);
                if !children.is_empty() {
                    hints.push(Hint::new(
                        HintKind::HierarchyGap,
                        format!(
                            "{} has no {} but {} {}",
                            self.short(dir),
                            PROJECT_FILE,
                            children.join(", "),
                            if children.len() == 1 { "does" } else { "do" }
                        ),
                    ));
                }
            }
            if dir == top.as_path() {
                break;
            }
        }

        hints
    }

    /// Names of immediate subdirectories holding a `CLAUDE.md`
    fn children_with_project_file(&self, dir: &Path) -> Vec<String> {
        let Ok(read) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = read
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| !self.settings.is_excluded_dir(n))
            .filter(|n| dir.join(n).join(PROJECT_FILE).is_file())
            .collect();
        names.sort();
        names
    }

    fn missing_sections(&self, target: &Path) -> Vec<Hint> {
        let Some(file) = [
            target.join(PROJECT_FILE),
            target.join(CONFIG_DIR).join(PROJECT_FILE),
        ]
        .into_iter()
        .find(|p| p.is_file()) else {
            return Vec::new();
        };
        let Some(content) = text::read_text(&file) else {
            return Vec::new();
        };
        let headers = text::section_headers(&content);
        let covers = |topics: &[&str]| {
            headers
                .iter()
                .any(|h| topics.iter().any(|t| h.title.contains(t)))
        };

        let mut hints = Vec::new();
        if !covers(STRUCTURE_TOPICS) {
            hints.push(Hint::new(
                HintKind::MissingSection,
                format!("{} has no project structure section", self.short(&file)),
            ));
        }
        if !covers(COMMAND_TOPICS) {
            hints.push(Hint::new(
                HintKind::MissingSection,
                format!("{} has no commands section", self.short(&file)),
            ));
        }
        hints
    }

    fn duplicate_sections(&self, entries: &[ConfigEntry]) -> Vec<Hint> {
        // header -> files in first-seen order
        let mut seen: Vec<(String, Vec<String>)> = Vec::new();

        for entry in entries.iter().filter(|e| e.is_startup()) {
            let Some(content) = text::read_text(&entry.location) else {
                continue;
            };
            let name = self.short(&entry.location);
            for header in text::section_headers(&content).into_iter().filter(|h| h.level == 2) {
                match seen.iter_mut().find(|(title, _)| *title == header.title) {
                    Some((_, files)) => {
                        if !files.contains(&name) {
                            files.push(name.clone());
                        }
                    }
                    None => seen.push((header.title, vec![name.clone()])),
                }
            }
        }

        seen.into_iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(title, files)| {
                Hint::new(
                    HintKind::Duplicate,
                    format!("section '{}' appears in {}", title, files.join(", ")),
                )
            })
            .collect()
    }

    fn local_not_ignored(&self, target: &Path) -> Option<Hint> {
        let local = target.join(LOCAL_FILE);
        if !local.is_file() {
            return None;
        }
        let ignored = git::is_ignored(&local).unwrap_or_else(|| gitignore_lists(target, LOCAL_FILE));
        if ignored {
            return None;
        }
        Some(Hint::new(
            HintKind::LocalNotIgnored,
            format!("{} is not ignored; add it to .gitignore", self.short(&local)),
        ))
    }

    fn auto_memory_overflow(&self, entries: &[ConfigEntry]) -> Vec<Hint> {
        entries
            .iter()
            .filter(|e| e.kind == EntryKind::AutoMemory && e.total_lines > AUTO_MEMORY_LIMIT)
            .map(|e| {
                Hint::new(
                    HintKind::AutoMemoryOverflow,
                    format!(
                        "{} has {} lines; only the first {} load. Move detail into topic files",
                        self.short(&e.location),
                        e.total_lines,
                        AUTO_MEMORY_LIMIT
                    ),
                )
            })
            .collect()
    }

    fn generic_names(&self, entries: &[ConfigEntry]) -> Vec<Hint> {
        entries
            .iter()
            .filter(|e| e.kind.is_rule())
            .filter(|e| {
                e.location
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| GENERIC_RULE_NAMES.contains(&s))
            })
            .map(|e| {
                Hint::new(
                    HintKind::GenericName,
                    format!("{}; name rule files after what they cover", self.short(&e.location)),
                )
            })
            .collect()
    }
}

fn is_dangling(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|m| m.file_type().is_symlink())
        && !path.exists()
}

fn has_project_file(dir: &Path) -> bool {
    dir.join(PROJECT_FILE).is_file() || dir.join(CONFIG_DIR).join(PROJECT_FILE).is_file()
}

/// Fallback outside a repository: does `<dir>/.gitignore` list `name`
fn gitignore_lists(dir: &Path, name: &str) -> bool {
    let Some(content) = text::read_text(&dir.join(".gitignore")) else {
        return false;
    };
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))
        .map(|l| l.trim_start_matches('/'))
        .any(|l| glob::Pattern::new(l).is_ok_and(|p| p.matches(name)))
}
