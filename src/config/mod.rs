//! @acp:module "Configuration"
//! @acp:summary "Fixed locations and audit thresholds, passed explicitly to the resolver"
//! @acp:domain cli
//! @acp:layer config

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MapError, Result};

/// Lines of the auto-memory file loaded at startup
pub const AUTO_MEMORY_LIMIT: usize = 200;

/// Maximum reference expansion depth
pub const MAX_REFERENCE_DEPTH: usize = 5;

/// Character budget for startup context
pub const DEFAULT_BUDGET_CHARS: usize = 40_000;

/// Hidden configuration folder, both below the home directory and in projects
pub const CONFIG_DIR: &str = ".claude";

/// Rules folder below a configuration folder
pub const RULES_DIR: &str = "rules";

/// Project-level memory file name
pub const PROJECT_FILE: &str = "CLAUDE.md";

/// Local override file name (not meant to be committed)
pub const LOCAL_FILE: &str = "CLAUDE.local.md";

/// Primary auto-memory file name
pub const AUTO_MEMORY_FILE: &str = "MEMORY.md";

/// Repository metadata folder, never searched for memory files
pub const GIT_DIR: &str = ".git";

/// Canonical skill entry file name
pub const SKILL_FILE: &str = "SKILL.md";

/// Skill-definition folders below a project's `.claude` directory
pub const SKILL_DIRS: &[&str] = &["skills", "commands"];

fn default_managed_policy() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support/ClaudeCode/CLAUDE.md")
    } else if cfg!(windows) {
        PathBuf::from(r"C:\ProgramData\ClaudeCode\CLAUDE.md")
    } else {
        PathBuf::from("/etc/claude-code/CLAUDE.md")
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_budget_chars() -> usize {
    DEFAULT_BUDGET_CHARS
}

fn default_large_file_lines() -> usize {
    300
}

fn default_large_file_chars() -> usize {
    15_000
}

fn default_unconditional_rule_lines() -> usize {
    30
}

fn default_skill_max_lines() -> usize {
    500
}

fn default_max_skills() -> usize {
    20
}


/// @acp:summary "Resolver and analyzer settings"
/// @acp:lock normal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Organization-managed policy file
    #[serde(default = "default_managed_policy", rename = "managedPolicy")]
    pub managed_policy: PathBuf,

    /// Home anchor for `~` references and user-level files
    #[serde(default = "default_home")]
    pub home: PathBuf,

    /// Startup context budget in characters
    #[serde(default = "default_budget_chars", rename = "budgetChars")]
    pub budget_chars: usize,

    /// Line count above which a startup file is flagged as large
    #[serde(default = "default_large_file_lines", rename = "largeFileLines")]
    pub large_file_lines: usize,

    /// Character count above which a startup file is flagged as large
    #[serde(default = "default_large_file_chars", rename = "largeFileChars")]
    pub large_file_chars: usize,

    /// Line count above which an unconditional project rule is flagged
    #[serde(
        default = "default_unconditional_rule_lines",
        rename = "unconditionalRuleLines"
    )]
    pub unconditional_rule_lines: usize,

    /// Line count above which a SKILL.md body is flagged
    #[serde(default = "default_skill_max_lines", rename = "skillMaxLines")]
    pub skill_max_lines: usize,

    /// Number of skills above which selective loading is suggested
    #[serde(default = "default_max_skills", rename = "maxSkills")]
    pub max_skills: usize,

    /// Extra directory names skipped when looking for child files (`.git` always is)
    #[serde(default, rename = "excludeDirs")]
    pub exclude_dirs: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            managed_policy: default_managed_policy(),
            home: default_home(),
            budget_chars: default_budget_chars(),
            large_file_lines: default_large_file_lines(),
            large_file_chars: default_large_file_chars(),
            unconditional_rule_lines: default_unconditional_rule_lines(),
            skill_max_lines: default_skill_max_lines(),
            max_skills: default_max_skills(),
            exclude_dirs: Vec::new(),
        }
    }
}

impl Settings {
    /// @acp:summary "Load settings from a JSON file"
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| MapError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// @acp:summary "Save settings to a JSON file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings rooted at a sandboxed home, used by tests and `--home`
    pub fn with_home<P: Into<PathBuf>>(home: P) -> Self {
        Self {
            home: home.into(),
            ..Self::default()
        }
    }

    /// `~/.claude`
    pub fn user_dir(&self) -> PathBuf {
        self.home.join(CONFIG_DIR)
    }

    /// `~/.claude/CLAUDE.md`
    pub fn user_memory(&self) -> PathBuf {
        self.user_dir().join(PROJECT_FILE)
    }

    /// `~/.claude/rules`
    pub fn user_rules(&self) -> PathBuf {
        self.user_dir().join(RULES_DIR)
    }

    /// `~/.claude/projects`
    pub fn auto_memory_base(&self) -> PathBuf {
        self.user_dir().join("projects")
    }

    /// Auto-memory file for a project key
    pub fn auto_memory_file(&self, project_key: &str) -> PathBuf {
        self.auto_memory_base()
            .join(project_key)
            .join("memory")
            .join(AUTO_MEMORY_FILE)
    }

    /// Whether a directory name is skipped by descendant walks
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        name == GIT_DIR || self.exclude_dirs.iter().any(|d| d == name)
    }
}
