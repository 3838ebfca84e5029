//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler

pub mod map;
pub mod output;

pub use map::{execute_map, project_dirs, MapOptions};
pub use output::{json_value, print_entries, print_header, print_hints, AuditReport};
