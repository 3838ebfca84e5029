//! @acp:module "Map Command"
//! @acp:summary "Resolve, render and optionally audit the memory map of a directory"
//! @acp:domain cli
//! @acp:layer handler

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use crate::audit::Analyzer;
use crate::config::{Settings, PROJECT_FILE};
use crate::resolve::{ProjectContext, Resolver};

use super::output;

/// Options for the map command
#[derive(Debug, Clone)]
pub struct MapOptions {
    /// Directory to map
    pub dir: PathBuf,
    /// Emit JSON instead of the grouped listing
    pub json: bool,
    /// Run the analyzer after mapping
    pub audit: bool,
    /// Map every immediate subdirectory holding a CLAUDE.md
    pub all_projects: bool,
}

/// Execute the map command
pub fn execute_map(options: MapOptions, settings: Settings) -> Result<()> {
    let resolver = Resolver::new(settings.clone());
    let analyzer = Analyzer::new(settings);

    if options.all_projects {
        return map_all_projects(&options, &resolver, &analyzer);
    }

    let context = ProjectContext::detect(&options.dir)?;
    if options.json {
        let value = map_json(&context, &resolver, &analyzer, options.audit)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        map_human(&context, &resolver, &analyzer, options.audit);
    }

    Ok(())
}

fn map_all_projects(options: &MapOptions, resolver: &Resolver, analyzer: &Analyzer) -> Result<()> {
    let parent = ProjectContext::detect(&options.dir)?;
    let projects = project_dirs(&parent.target)
        .with_context(|| format!("Failed to list {}", parent.target.display()))?;

    if options.json {
        let mut by_dir = serde_json::Map::new();
        for dir in &projects {
            let context = ProjectContext::detect(dir)?;
            let value = map_json(&context, resolver, analyzer, options.audit)?;
            by_dir.insert(dir.to_string_lossy().into_owned(), value);
        }
        println!("{}", serde_json::to_string_pretty(&by_dir)?);
        return Ok(());
    }

    if projects.is_empty() {
        println!(
            "{} No subdirectories with {} in {}",
            style("•").dim(),
            PROJECT_FILE,
            parent.target.display()
        );
        return Ok(());
    }
    for dir in &projects {
        let context = ProjectContext::detect(dir)?;
        map_human(&context, resolver, analyzer, options.audit);
    }
    Ok(())
}

fn map_json(
    context: &ProjectContext,
    resolver: &Resolver,
    analyzer: &Analyzer,
    audit: bool,
) -> Result<serde_json::Value> {
    let entries = resolver.resolve_context(context);
    let audit = audit.then(|| {
        let hints = analyzer.run(&entries, &context.target);
        (analyzer.summarize(&entries), hints)
    });
    Ok(output::json_value(&entries, audit)?)
}

fn map_human(context: &ProjectContext, resolver: &Resolver, analyzer: &Analyzer, audit: bool) {
    let entries = resolver.resolve_context(context);
    let summary = analyzer.summarize(&entries);

    output::print_header(context);
    output::print_entries(&entries, &summary, &resolver.settings().home);
    if audit {
        output::print_hints(&analyzer.run(&entries, &context.target));
    }
}

/// Immediate subdirectories of `dir` that hold a CLAUDE.md, sorted
pub fn project_dirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(PROJECT_FILE).is_file())
        .collect();
    dirs.sort();
    Ok(dirs)
}
