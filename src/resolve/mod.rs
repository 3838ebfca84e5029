//! @acp:module "Layer Resolver"
//! @acp:summary "Enumerate every memory source that applies to a directory, in precedence order"
//! @acp:domain cli
//! @acp:layer service
//!
//! # Discovery order
//!
//! 1. Managed policy file
//! 2. `~/.claude/CLAUDE.md`
//! 3. `~/.claude/rules/**/*.md`
//! 4. Auto-memory `MEMORY.md` for the project, then its topic files (on-demand)
//! 5. For each directory from `/` down to the target: `CLAUDE.md`,
//!    `CLAUDE.local.md`, `.claude/CLAUDE.md`, `.claude/rules/**/*.md`
//! 6. `CLAUDE.md` in descendant directories (on-demand)
//! 7. Files under `.claude/skills` and `.claude/commands` (on-demand)
//!
//! Startup sources (1-5) are reference-expanded as soon as they are
//! recorded. Missing sources are skipped. The final list is deduplicated so
//! the earliest discovery of a location wins.

pub mod dedupe;

pub use dedupe::dedupe;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{
    Settings, AUTO_MEMORY_FILE, AUTO_MEMORY_LIMIT, CONFIG_DIR, LOCAL_FILE, PROJECT_FILE, RULES_DIR,
    SKILL_DIRS,
};
use crate::entry::{ConfigEntry, EntryKind, Sequence};
use crate::error::{MapError, Result};
use crate::expand::ReferenceExpander;
use crate::git;
use crate::text;

/// @acp:summary "Identity of the directory being resolved"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    /// Canonical target directory
    pub target: PathBuf,
    /// Work tree root of the enclosing repository
    pub repo_root: Option<PathBuf>,
    /// Auto-memory folder name
    pub project_key: String,
}

impl ProjectContext {
    /// @acp:summary "Validate and canonicalize a target directory"
    pub fn detect(target: &Path) -> Result<Self> {
        let canonical = std::fs::canonicalize(target)
            .map_err(|_| MapError::InvalidTarget(target.to_path_buf()))?;
        if !canonical.is_dir() {
            return Err(MapError::InvalidTarget(target.to_path_buf()));
        }
        let repo_root = git::find_repo_root(&canonical);
        let project_key = project_key(repo_root.as_deref().unwrap_or(&canonical));
        Ok(Self {
            target: canonical,
            repo_root,
            project_key,
        })
    }
}

/// Auto-memory key: the absolute path with every `/` replaced by `-`
pub fn project_key(base: &Path) -> String {
    base.to_string_lossy().replace('/', "-")
}

/// Accumulates entries with sequential priorities
struct Collector<'a> {
    expander: &'a ReferenceExpander,
    seq: Sequence,
    entries: Vec<ConfigEntry>,
}

impl<'a> Collector<'a> {
    fn new(expander: &'a ReferenceExpander) -> Self {
        Self {
            expander,
            seq: Sequence::new(),
            entries: Vec::new(),
        }
    }

    /// Record a startup source and expand its references
    fn startup(&mut self, path: &Path, kind: EntryKind) {
        self.startup_with(path, kind, |entry| entry);
    }

    /// Record a rule file with frontmatter-derived path filters
    fn rule(&mut self, path: &Path, kind: EntryKind) {
        let filters = text::frontmatter(path).paths();
        self.startup_with(path, kind, |entry| entry.with_path_filters(filters));
    }

    fn startup_with(
        &mut self,
        path: &Path,
        kind: EntryKind,
        adjust: impl FnOnce(ConfigEntry) -> ConfigEntry,
    ) {
        let Some(location) = existing_file(path) else {
            tracing::trace!(path = %path.display(), kind = %kind, "Source absent");
            return;
        };
        let entry = adjust(ConfigEntry::new(location.clone(), kind, self.seq.next_priority()));
        tracing::trace!(path = %location.display(), kind = %kind, priority = entry.priority, "Source recorded");
        self.entries.push(entry);

        let references = self.expander.expand_from(&location, &mut self.seq);
        self.entries.extend(references);
    }

    /// Record an on-demand source without expansion
    fn on_demand(&mut self, path: &Path, kind: EntryKind) {
        if let Some(location) = existing_file(path) {
            let entry = ConfigEntry::new(location, kind, self.seq.next_priority());
            self.entries.push(entry);
        }
    }
}

/// @acp:summary "Resolves the ordered memory map of a directory"
pub struct Resolver {
    settings: Settings,
    expander: ReferenceExpander,
}

impl Resolver {
    pub fn new(settings: Settings) -> Self {
        let expander = ReferenceExpander::new(&settings);
        Self { settings, expander }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// @acp:summary "Resolve a target directory into deduplicated entries"
    pub fn resolve(&self, target: &Path) -> Result<Vec<ConfigEntry>> {
        let context = ProjectContext::detect(target)?;
        Ok(self.resolve_context(&context))
    }

    /// @acp:summary "Resolve an already validated project context"
    pub fn resolve_context(&self, context: &ProjectContext) -> Vec<ConfigEntry> {
        let mut collector = Collector::new(&self.expander);

        collector.startup(&self.settings.managed_policy, EntryKind::Managed);
        collector.startup(&self.settings.user_memory(), EntryKind::User);
        for rule in markdown_files(&self.settings.user_rules()) {
            collector.rule(&rule, EntryKind::UserRule);
        }

        self.collect_auto_memory(&mut collector, context);

        for level in hierarchy(&context.target) {
            collector.startup(&level.join(PROJECT_FILE), EntryKind::Project);
            collector.startup(&level.join(LOCAL_FILE), EntryKind::Local);
            let config_dir = level.join(CONFIG_DIR);
            collector.startup(&config_dir.join(PROJECT_FILE), EntryKind::Project);
            for rule in markdown_files(&config_dir.join(RULES_DIR)) {
                collector.rule(&rule, EntryKind::ProjectRule);
            }
        }

        for child in self.child_files(&context.target) {
            collector.on_demand(&child, EntryKind::Child);
        }
        for skill in skill_files(&context.target) {
            collector.on_demand(&skill, EntryKind::Skill);
        }

        let total = collector.entries.len();
        let entries = dedupe(collector.entries);
        tracing::debug!(
            dir = %context.target.display(),
            discovered = total,
            resolved = entries.len(),
            "Resolution complete"
        );
        entries
    }

    fn collect_auto_memory(&self, collector: &mut Collector<'_>, context: &ProjectContext) {
        let memory_file = self.settings.auto_memory_file(&context.project_key);
        collector.startup_with(&memory_file, EntryKind::AutoMemory, |entry| {
            entry.with_line_cap(AUTO_MEMORY_LIMIT)
        });
        if !memory_file.is_file() {
            return;
        }

        let Some(memory_dir) = memory_file.parent() else {
            return;
        };
        let Ok(read) = std::fs::read_dir(memory_dir) else {
            return;
        };
        let mut topics: Vec<PathBuf> = read
            .flatten()
            .map(|e| e.path())
            .filter(|p| is_markdown(p) && p.is_file())
            .filter(|p| p.file_name().is_some_and(|n| n != AUTO_MEMORY_FILE))
            .collect();
        topics.sort();
        for topic in topics {
            collector.on_demand(&topic, EntryKind::AutoMemoryTopic);
        }
    }

    /// `CLAUDE.md` files in descendants of the target, excluding its own
    fn child_files(&self, target: &Path) -> Vec<PathBuf> {
        WalkDir::new(target)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                !self.settings.is_excluded_dir(&e.file_name().to_string_lossy())
            })
            .filter_map(|e| e.ok())
            // depth 1 is the target's own file
            .filter(|e| e.depth() >= 2)
            .filter(|e| e.file_name() == PROJECT_FILE && e.path().is_file())
            .map(|e| e.into_path())
            .collect()
    }
}

/// Directories from the filesystem root down to `target`
pub fn hierarchy(target: &Path) -> Vec<PathBuf> {
    let mut levels: Vec<PathBuf> = target.ancestors().map(Path::to_path_buf).collect();
    levels.reverse();
    levels
}

/// Markdown files below `dir`, ordered by relative path
fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    rule_paths(dir, true)
}

/// Markdown paths below `dir` in lexicographic order.
///
/// Without `follow_links` a symlink is listed as itself and never entered,
/// so dangling links show up instead of being dropped.
pub(crate) fn rule_paths(dir: &Path, follow_links: bool) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(follow_links)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir() && is_markdown(e.path()))
        .map(|e| e.into_path())
        .collect();
    sort_lexicographic(&mut files);
    files
}

/// Every file below the project's skill folders, ordered by path
fn skill_files(target: &Path) -> Vec<PathBuf> {
    let config_dir = target.join(CONFIG_DIR);
    SKILL_DIRS
        .iter()
        .map(|name| config_dir.join(name))
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| {
            let mut files: Vec<PathBuf> = WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();
            sort_lexicographic(&mut files);
            files
        })
        .collect()
}

/// Byte order of the full path string, so `a-b.md` sorts before `a/x.md`
fn sort_lexicographic(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

fn existing_file(path: &Path) -> Option<PathBuf> {
    if !path.is_file() {
        return None;
    }
    std::fs::canonicalize(path).ok()
}
