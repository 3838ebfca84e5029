//! Analyzer integration tests
//!
//! Resolution and audit run together over sandboxed trees.

use std::fs;
use std::path::{Path, PathBuf};

use memory_map::audit::summarize;
use memory_map::{project_key, Analyzer, ConfigEntry, EntryKind, Hint, HintKind, Resolver, Settings};
use tempfile::TempDir;

struct Sandbox {
    _temp: TempDir,
    root: PathBuf,
    project: PathBuf,
    settings: Settings,
}

impl Sandbox {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        let project = root.join("app");
        fs::create_dir_all(&project).unwrap();
        let settings = Settings {
            managed_policy: root.join("etc").join("CLAUDE.md"),
            ..Settings::with_home(root.join("home"))
        };
        Self {
            _temp: temp,
            root,
            project,
            settings,
        }
    }

    fn write(&self, path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Seed an auto-memory file so the reminder hint stays quiet
    fn with_auto_memory(&self) {
        let memory = self.settings.auto_memory_file(&project_key(&self.project));
        self.write(&memory, "- prefers small commits\n");
    }

    fn entries(&self) -> Vec<ConfigEntry> {
        Resolver::new(self.settings.clone())
            .resolve(&self.project)
            .unwrap()
            .into_iter()
            .filter(|e| e.location.starts_with(&self.root))
            .collect()
    }

    fn audit(&self) -> Vec<Hint> {
        Analyzer::new(self.settings.clone()).run(&self.entries(), &self.project)
    }
}

fn kinds(hints: &[Hint]) -> Vec<HintKind> {
    hints.iter().map(|h| h.kind).collect()
}

const HEALTHY_PROJECT: &str = "# App\n\n## Project structure\nsrc/ holds code\n\n## Commands\ncargo test\n";

// =============================================================================
// Budget
// =============================================================================

mod budget_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_budget_math_from_resolved_entries() {
        let sb = Sandbox::new();
        sb.write(&sb.project.join("CLAUDE.md"), &"x".repeat(10_000));
        sb.write(
            &sb.project.join(".claude").join("rules").join("api.md"),
            &format!("---\npaths: [\"*.md\"]\n---\n{}", "y".repeat(4_976)),
        );

        let entries = sb.entries();
        let summary = summarize(&entries, 40_000);
        assert_eq!(summary.base, 10_000);
        assert_eq!(summary.max, 15_000);
        assert_eq!(summary.base_pct, 25);
        assert_eq!(summary.max_pct, 37);

        let hints = Analyzer::new(sb.settings.clone()).run(&entries, &sb.project);
        assert!(!kinds(&hints).contains(&HintKind::OverBudget));
        assert!(!kinds(&hints).contains(&HintKind::BudgetRisk));
    }

    #[test]
    fn test_over_budget_hint() {
        let mut sb = Sandbox::new();
        sb.settings.budget_chars = 100;
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), &format!("{HEALTHY_PROJECT}{}", "z".repeat(200)));

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::OverBudget]);
        assert!(hints[0].to_string().starts_with("OVER BUDGET: "));
    }

    #[test]
    fn test_budget_risk_from_live_conditional_rule() {
        let mut sb = Sandbox::new();
        sb.settings.budget_chars = 1_000;
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        sb.write(&sb.project.join("src").join("lib.rs"), "");
        sb.write(
            &sb.project.join(".claude").join("rules").join("api.md"),
            &format!("---\npaths: [\"src/**\"]\n---\n{}", "y".repeat(1_000)),
        );

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::BudgetRisk]);
        assert!(hints[0].to_string().starts_with("BUDGET RISK: "));
        assert!(hints[0].message.ends_with("of 1000)"));
    }

    #[test]
    fn test_large_by_lines_and_by_chars() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(
            &sb.project.join("CLAUDE.md"),
            &format!("{HEALTHY_PROJECT}{}", "detail\n".repeat(301)),
        );
        sb.write(&sb.project.join(".claude").join("CLAUDE.md"), &"w".repeat(15_001));

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::Large, HintKind::Large]);
        assert!(hints[0].message.contains("CLAUDE.md (308 lines"));
        assert!(hints[1].message.contains(", 15001 chars)"));
    }
}

// =============================================================================
// Dead rules
// =============================================================================

mod dead_rule_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dead_rule_names_file_and_directory() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        sb.write(&sb.project.join("src").join("main.rs"), "fn main() {}");
        let rule = sb.project.join(".claude").join("rules").join("frontend.md");
        sb.write(&rule, "---\npaths:\n  - \"web/**/*.tsx\"\n---\nReact notes\n");

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::DeadRule]);
        assert!(hints[0].message.contains(&rule.display().to_string()));
        assert!(hints[0].message.contains(&sb.project.display().to_string()));
    }

    #[test]
    fn test_any_matching_filter_keeps_rule_alive() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        sb.write(&sb.project.join("src").join("lib.rs"), "");
        sb.write(
            &sb.project.join(".claude").join("rules").join("rust.md"),
            "---\npaths: [\"web/**\", \"src/**/*.{rs,toml}\"]\n---\n",
        );

        assert_eq!(kinds(&sb.audit()), vec![HintKind::Ok]);
    }
}

// =============================================================================
// Structure and hygiene
// =============================================================================

mod hygiene_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_healthy_project_is_ok() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::Ok]);
        assert_eq!(hints[0].to_string(), "OK: no issues found");
    }

    #[test]
    fn test_auto_memory_overflow_and_missing_auto_memory() {
        let sb = Sandbox::new();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        assert_eq!(kinds(&sb.audit()), vec![HintKind::NoAutoMemory]);

        let memory = sb.settings.auto_memory_file(&project_key(&sb.project));
        sb.write(&memory, &"- note\n".repeat(250));
        assert_eq!(kinds(&sb.audit()), vec![HintKind::AutoMemoryOverflow]);
    }

    #[test]
    fn test_duplicate_sections_across_startup_files() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), &format!("{HEALTHY_PROJECT}\n## Testing\n"));
        sb.write(&sb.root.join("CLAUDE.md"), "## Testing\nrun everything\n");

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::Duplicate]);
        assert!(hints[0].message.starts_with("section 'testing' appears in "));
    }

    #[test]
    fn test_generic_rule_name() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        sb.write(&sb.project.join(".claude").join("rules").join("general.md"), "Be nice\n");

        assert_eq!(kinds(&sb.audit()), vec![HintKind::GenericName]);
    }

    #[test]
    fn test_skill_hygiene() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        let skills = sb.project.join(".claude").join("skills");
        sb.write(&skills.join("deploy").join("SKILL.md"), "---\nname: deploy\n---\nShip it\n");
        sb.write(&skills.join("bare").join("SKILL.md"), "No header\n");
        sb.write(&skills.join("old").join("prompt.md"), "legacy\n");

        let messages: Vec<_> = sb
            .audit()
            .into_iter()
            .inspect(|h| assert_eq!(h.kind, HintKind::Skill))
            .map(|h| h.message)
            .collect();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].ends_with("bare/SKILL.md has no frontmatter"));
        assert!(messages[1].ends_with("deploy/SKILL.md is missing `description` in frontmatter"));
        assert!(messages[2].contains("old has no SKILL.md"));
    }

    #[test]
    fn test_long_skill_body() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        sb.write(
            &sb.project.join(".claude").join("skills").join("migrate").join("SKILL.md"),
            &format!(
                "---\nname: migrate\ndescription: Run schema migrations\n---\n{}",
                "step\n".repeat(501)
            ),
        );

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::Skill]);
        assert!(hints[0].message.contains("migrate/SKILL.md body is"));
        assert!(hints[0].message.ends_with("(over 500); move detail into supporting files"));
    }

    #[test]
    fn test_too_many_skills() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        let skills = sb.project.join(".claude").join("skills");
        for i in 0..20 {
            sb.write(
                &skills.join(format!("task{i:02}")).join("SKILL.md"),
                &format!("---\nname: task{i:02}\ndescription: Task {i}\n---\nDo it\n"),
            );
        }
        assert_eq!(kinds(&sb.audit()), vec![HintKind::Ok]);

        sb.write(
            &skills.join("task20").join("SKILL.md"),
            "---\nname: task20\ndescription: Task 20\n---\nDo it\n",
        );
        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::Skill]);
        assert_eq!(hints[0].message, "21 skills defined (over 20); consider selective loading");
    }

    #[test]
    fn test_local_file_checked_against_repository_ignores() {
        let sb = Sandbox::new();
        git2::Repository::init(&sb.project).unwrap();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        sb.write(&sb.project.join("CLAUDE.local.md"), "my overrides\n");

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::LocalNotIgnored]);
        assert!(hints[0].message.ends_with("is not ignored; add it to .gitignore"));

        sb.write(&sb.project.join(".gitignore"), "CLAUDE.local.md\n");
        assert_eq!(kinds(&sb.audit()), vec![HintKind::Ok]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_nested_rule_link() {
        let sb = Sandbox::new();
        sb.with_auto_memory();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        let nested = sb.project.join(".claude").join("rules").join("team");
        fs::create_dir_all(&nested).unwrap();
        std::os::unix::fs::symlink(sb.root.join("moved.md"), nested.join("review.md")).unwrap();

        let hints = sb.audit();
        assert_eq!(kinds(&hints), vec![HintKind::BrokenLink]);
        assert!(hints[0].message.contains("team/review.md -> "));
        assert!(hints[0].message.ends_with("moved.md (target missing)"));
    }

    #[test]
    fn test_entry_kinds_in_audited_map() {
        let sb = Sandbox::new();
        sb.write(&sb.project.join("CLAUDE.md"), HEALTHY_PROJECT);
        let entries = sb.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Project);
    }
}
