//! @acp:module "Skill Hygiene"
//! @acp:summary "Frontmatter, size and layout checks for skill definitions"
//! @acp:domain cli
//! @acp:layer logic

use std::path::Path;

use crate::config::{Settings, CONFIG_DIR, SKILL_DIRS, SKILL_FILE};
use crate::entry::{ConfigEntry, EntryKind};
use crate::text::{self, frontmatter::DELIMITER, Frontmatter};

use super::{Hint, HintKind};

/// Fields every SKILL.md frontmatter must carry
const REQUIRED_FIELDS: &[&str] = &["name", "description"];

/// @acp:summary "Run all skill checks"
pub fn check(entries: &[ConfigEntry], target: &Path, settings: &Settings) -> Vec<Hint> {
    let mut hints = Vec::new();
    let short = |p: &Path| text::short_path(p, &settings.home);

    let skill_files: Vec<&ConfigEntry> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Skill && e.file_name() == SKILL_FILE)
        .collect();

    for entry in &skill_files {
        let Some(content) = text::read_text(&entry.location) else {
            continue;
        };
        let frontmatter = Frontmatter::parse(&content);
        if !frontmatter.is_present() {
            hints.push(Hint::new(
                HintKind::Skill,
                format!("{} has no frontmatter", short(&entry.location)),
            ));
        } else {
            for field in REQUIRED_FIELDS {
                if frontmatter.scalar(field).is_none() {
                    hints.push(Hint::new(
                        HintKind::Skill,
                        format!("{} is missing `{}` in frontmatter", short(&entry.location), field),
                    ));
                }
            }
        }

        let lines = body_lines(&content, frontmatter.is_present());
        if lines > settings.skill_max_lines {
            hints.push(Hint::new(
                HintKind::Skill,
                format!(
                    "{} body is {} lines (over {}); move detail into supporting files",
                    short(&entry.location),
                    lines,
                    settings.skill_max_lines
                ),
            ));
        }
    }

    for folder in legacy_folders(target) {
        hints.push(Hint::new(
            HintKind::Skill,
            format!("{} has no {}; legacy skill layout", short(&folder), SKILL_FILE),
        ));
    }

    if skill_files.len() > settings.max_skills {
        hints.push(Hint::new(
            HintKind::Skill,
            format!(
                "{} skills defined (over {}); consider selective loading",
                skill_files.len(),
                settings.max_skills
            ),
        ));
    }

    hints
}

/// Lines after the frontmatter block
fn body_lines(content: &str, has_frontmatter: bool) -> usize {
    if !has_frontmatter {
        return content.lines().count();
    }
    let mut lines = content.lines();
    lines.next();
    lines
        .position(|l| l.trim_end() == DELIMITER)
        .map(|closing| content.lines().count().saturating_sub(closing + 2))
        .unwrap_or(0)
}

/// Non-hidden folders directly under `.claude/skills` with no SKILL.md
fn legacy_folders(target: &Path) -> Vec<std::path::PathBuf> {
    let skills_dir = target.join(CONFIG_DIR).join(SKILL_DIRS[0]);
    let Ok(read) = std::fs::read_dir(&skills_dir) else {
        return Vec::new();
    };
    let mut folders: Vec<_> = read
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| !n.to_string_lossy().starts_with('.'))
        })
        .filter(|p| !p.join(SKILL_FILE).is_file())
        .collect();
    folders.sort();
    folders
}
