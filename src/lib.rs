#![forbid(unsafe_code)]

//! @acp:module "Memory Map Library"
//! @acp:summary "Resolve which memory and instruction files apply to a directory"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability stable
//!
//! # memory-map
//!
//! Reproduces how an AI coding assistant layers its persistent memory files:
//! which sources apply to a working directory, in what order, at what size,
//! and whether the configuration is well-formed.
//!
//! ## Features
//!
//! - **Layer resolution**: managed policy, user files, auto-memory, project
//!   hierarchy, child directories and skills in precedence order
//! - **Reference expansion**: `@path` includes, cycle-safe and depth-bounded
//! - **Audit**: budget accounting and structural diagnostics
//! - **JSON output**: one record per source
//!
//! ## Example
//!
//! ```rust,no_run
//! use memory_map::{Analyzer, ProjectContext, Resolver, Settings};
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::default();
//!     let context = ProjectContext::detect(".".as_ref())?;
//!     let entries = Resolver::new(settings.clone()).resolve_context(&context);
//!
//!     for hint in Analyzer::new(settings).run(&entries, &context.target) {
//!         println!("{hint}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod commands;
pub mod config;
pub mod entry;
pub mod error;
pub mod expand;
pub mod git;
pub mod resolve;
pub mod text;

// Re-exports
pub use audit::{Analyzer, BudgetSummary, Hint, HintKind};
pub use config::Settings;
pub use entry::{ConfigEntry, EntryKind, EntryRecord, Group, LoadClass};
pub use error::{MapError, Result};
pub use expand::ReferenceExpander;
pub use resolve::{dedupe, project_key, ProjectContext, Resolver};
pub use text::{Frontmatter, Header};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
