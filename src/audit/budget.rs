//! @acp:module "Budget"
//! @acp:summary "Startup character totals against the context budget"
//! @acp:domain cli
//! @acp:layer logic

use serde::{Deserialize, Serialize};

use crate::entry::ConfigEntry;

/// @acp:summary "Always-loaded and worst-case startup totals"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// Characters loaded regardless of which files are touched
    pub base: usize,
    /// Characters loaded if every conditional rule activates
    pub max: usize,
    pub budget: usize,
    pub base_pct: usize,
    pub max_pct: usize,
}

impl BudgetSummary {
    pub fn is_over(&self) -> bool {
        self.base > self.budget
    }

    /// Within budget now, over it once conditional rules activate
    pub fn is_at_risk(&self) -> bool {
        !self.is_over() && self.max > self.budget
    }
}

/// @acp:summary "Sum startup sizes and express them as budget percentages"
pub fn summarize(entries: &[ConfigEntry], budget: usize) -> BudgetSummary {
    let (base, max) = entries
        .iter()
        .filter(|e| e.is_startup())
        .fold((0, 0), |(base, max), e| {
            let size = e.size_chars();
            let base = if e.conditional { base } else { base + size };
            (base, max + size)
        });

    BudgetSummary {
        base,
        max,
        budget,
        base_pct: percent(base, budget),
        max_pct: percent(max, budget),
    }
}

/// Floor percentage; a zero budget reads as 0%
fn percent(value: usize, budget: usize) -> usize {
    if budget == 0 {
        return 0;
    }
    value * 100 / budget
}
