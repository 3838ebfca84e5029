//! @acp:module "Deduplicator"
//! @acp:summary "Collapse entries that resolve to the same canonical location"
//! @acp:domain cli
//! @acp:layer logic

use std::collections::HashSet;

use crate::entry::ConfigEntry;

/// Keep the first entry per location; later duplicates are dropped whole
pub fn dedupe(entries: Vec<ConfigEntry>) -> Vec<ConfigEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            let first = seen.insert(entry.location.clone());
            if !first {
                tracing::debug!(path = %entry.location.display(), kind = %entry.kind, "Duplicate dropped");
            }
            first
        })
        .collect()
}
