//! @acp:module "Output"
//! @acp:summary "Human and JSON rendering of memory maps and audit hints"
//! @acp:domain cli
//! @acp:layer presentation

use std::path::Path;

use console::{style, Style};
use serde::Serialize;

use crate::audit::{BudgetSummary, Hint, HintKind};
use crate::entry::{ConfigEntry, EntryKind, EntryRecord, Group};
use crate::resolve::ProjectContext;
use crate::text::short_path;

/// Width of section rules
const RULE_WIDTH: usize = 50;

/// @acp:summary "JSON document for a map rendered with --audit"
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub entries: Vec<EntryRecord>,
    pub budget: BudgetSummary,
    pub hints: Vec<Hint>,
}

/// JSON projection of a map, with or without audit data
pub fn json_value(
    entries: &[ConfigEntry],
    audit: Option<(BudgetSummary, Vec<Hint>)>,
) -> serde_json::Result<serde_json::Value> {
    let records: Vec<EntryRecord> = entries.iter().map(ConfigEntry::to_record).collect();
    match audit {
        Some((budget, hints)) => serde_json::to_value(AuditReport {
            entries: records,
            budget,
            hints,
        }),
        None => serde_json::to_value(records),
    }
}

/// Color associated with an entry kind
fn kind_style(kind: EntryKind) -> Style {
    match kind {
        EntryKind::Managed => Style::new().red(),
        EntryKind::User | EntryKind::UserRule => Style::new().cyan(),
        EntryKind::AutoMemory => Style::new().magenta(),
        EntryKind::AutoMemoryTopic => Style::new().magenta().dim(),
        EntryKind::Project => Style::new().green(),
        EntryKind::ProjectRule => Style::new().yellow(),
        EntryKind::Local => Style::new().blue(),
        EntryKind::Child | EntryKind::Skill => Style::new().dim(),
        EntryKind::Reference => Style::new().cyan().dim(),
    }
}

/// @acp:summary "Print the header block naming target, repository and key"
pub fn print_header(context: &ProjectContext) {
    println!(
        "{} Memory map for {}",
        style("→").cyan(),
        style(context.target.display()).bold()
    );
    if let Some(root) = &context.repo_root {
        println!("  Git: {}", style(root.display()).dim());
    }
    println!("  Key: {}", style(&context.project_key).dim());
    println!();
}

/// @acp:summary "Print entries grouped by loading class, then totals"
pub fn print_entries(entries: &[ConfigEntry], summary: &BudgetSummary, home: &Path) {
    for group in Group::ALL {
        let members: Vec<&ConfigEntry> = entries.iter().filter(|e| e.group() == group).collect();
        if members.is_empty() {
            continue;
        }

        println!("  {} ({} files)", style(group.title()).bold(), members.len());
        println!("  {}", "─".repeat(RULE_WIDTH));
        for entry in members {
            print_entry(entry, home);
        }
        println!();
    }

    print_totals(entries, summary);
}

fn print_entry(entry: &ConfigEntry, home: &Path) {
    let kind_style = kind_style(entry.kind);
    println!(
        "  [{}] {}",
        kind_style.apply_to(entry.kind.marker()),
        short_path(&entry.location, home)
    );

    let mut detail = format!(
        "{} | {} | {} chars",
        entry.kind.label(),
        entry.size_display(),
        entry.size_chars()
    );
    if entry.conditional {
        detail.push_str(&format!(" | paths: {}", entry.path_filters.join(", ")));
    }
    if let Some(referrer) = &entry.referenced_from {
        detail.push_str(&format!(" (from {})", short_path(referrer, home)));
    }
    println!("       {}", style(detail).dim());
}

fn print_totals(entries: &[ConfigEntry], summary: &BudgetSummary) {
    let startup: Vec<&ConfigEntry> = entries.iter().filter(|e| e.is_startup()).collect();
    let lines: usize = startup.iter().map(|e| e.loaded_lines).sum();
    let on_demand = entries.len() - startup.len();

    println!("  {}", "─".repeat(RULE_WIDTH));
    println!(
        "  Startup: {} files, ~{} lines, {} chars ({}% of {})",
        startup.len(),
        lines,
        summary.base,
        percent_style(summary.base_pct).apply_to(summary.base_pct),
        summary.budget
    );
    if summary.max != summary.base {
        println!(
            "  With all conditional rules: {} chars ({}% of {})",
            summary.max,
            percent_style(summary.max_pct).apply_to(summary.max_pct),
            summary.budget
        );
    }
    if on_demand > 0 {
        println!("  On-demand: {} files (loaded when needed)", on_demand);
    }
    println!();
}

fn percent_style(pct: usize) -> Style {
    match pct {
        0..=74 => Style::new().green(),
        75..=100 => Style::new().yellow(),
        _ => Style::new().red(),
    }
}

/// @acp:summary "Print audit hints with a severity marker"
pub fn print_hints(hints: &[Hint]) {
    println!("  {}", "─".repeat(RULE_WIDTH));
    println!("  {}", style("Audit").bold());
    for hint in hints {
        let marker = match hint.kind {
            HintKind::Ok => style("✓").green(),
            HintKind::BrokenLink | HintKind::OverBudget => style("✗").red(),
            HintKind::NoAutoMemory => style("•").dim(),
            _ => style("⚠").yellow(),
        };
        println!(
            "    {} {}: {}",
            marker,
            style(hint.kind.label()).bold(),
            hint.message
        );
    }
    println!();
}
