#![forbid(unsafe_code)]
//! memory-map Command Line Interface

use std::path::PathBuf;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use memory_map::commands::{execute_map, MapOptions};
use memory_map::Settings;

#[derive(Parser)]
#[command(name = "memory-map")]
#[command(about = "Show which memory files apply to a directory, and how much they cost")]
#[command(version)]
struct Cli {
    /// Directory to map
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Run optimization and hygiene checks
    #[arg(short, long)]
    audit: bool,

    /// Map every subdirectory that has a CLAUDE.md
    #[arg(long)]
    all_projects: bool,

    /// Disable colors
    #[arg(long)]
    plain: bool,

    /// Settings file path
    #[arg(short, long, default_value = ".memory-map.json")]
    config: PathBuf,

    /// Home directory override
    #[arg(long, env = "MEMORY_MAP_HOME")]
    home: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.plain {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    // Load settings
    let mut settings = if cli.config.exists() {
        match Settings::load(&cli.config) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %cli.config.display(), error = %e, "Unusable settings file");
                eprintln!("{} {}", style("✗").red(), e);
                std::process::exit(1);
            }
        }
    } else {
        Settings::default()
    };
    if let Some(home) = cli.home {
        settings.home = home;
    }

    let options = MapOptions {
        dir: cli.dir,
        json: cli.json,
        audit: cli.audit,
        all_projects: cli.all_projects,
    };
    if let Err(e) = execute_map(options, settings) {
        eprintln!("{} {:#}", style("✗").red(), e);
        std::process::exit(1);
    }

    Ok(())
}
