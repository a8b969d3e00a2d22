//! Per-category allocation analysis against target shares.
//!
//! The advisor compares each category's observed share of total tokens with
//! a target table and proposes token-level adjustments: categories far over
//! target shrink, categories far under target grow toward it, everything
//! else is left alone.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::context::{ContextCategory, StoreSummary};

/// Default target share of total tokens per category.
pub const DEFAULT_TARGET_SHARES: [(ContextCategory, f64); 6] = [
    (ContextCategory::Foundation, 0.15),
    (ContextCategory::AgentOutput, 0.50),
    (ContextCategory::Template, 0.20),
    (ContextCategory::Metadata, 0.10),
    (ContextCategory::Debug, 0.03),
    (ContextCategory::Temporary, 0.02),
];

/// A category is over-allocated above this multiple of its target share.
const OVER_FACTOR: f64 = 1.5;

/// A category is under-allocated below this multiple of its target share.
const UNDER_FACTOR: f64 = 0.5;

/// Fraction of current tokens shed from an over-allocated category.
const REDUCE_FRACTION: f64 = 0.3;

/// Fraction of the gap to target granted to an under-allocated category.
const GROW_FRACTION: f64 = 0.5;

/// Advisory reallocation of the token budget across categories.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationAdvice {
    pub current_allocation: BTreeMap<ContextCategory, usize>,
    pub recommended_allocation: BTreeMap<ContextCategory, usize>,
    /// Signed token delta per category (recommended − current).
    pub expected_change: BTreeMap<ContextCategory, i64>,
    pub rationale: String,
}

impl AllocationAdvice {
    /// Whether the advice proposes any change at all.
    pub fn is_balanced(&self) -> bool {
        self.expected_change.values().all(|delta| *delta == 0)
    }
}

/// Default target-share table as a map.
pub fn default_targets() -> BTreeMap<ContextCategory, f64> {
    DEFAULT_TARGET_SHARES.into_iter().collect()
}

/// Analyze the summary's per-category allocation against the targets.
pub fn advise(
    summary: &StoreSummary,
    targets: &BTreeMap<ContextCategory, f64>,
) -> AllocationAdvice {
    let mut current = BTreeMap::new();
    for cat in ContextCategory::ALL {
        current.insert(
            cat,
            summary.tokens_by_category.get(&cat).copied().unwrap_or(0),
        );
    }

    let total = summary.total_tokens;
    if total == 0 {
        return AllocationAdvice {
            recommended_allocation: current.clone(),
            expected_change: current.keys().map(|c| (*c, 0i64)).collect(),
            current_allocation: current,
            rationale: "No content to analyze.".to_string(),
        };
    }

    let mut recommended = BTreeMap::new();
    let mut change = BTreeMap::new();
    let mut notes = Vec::new();

    for cat in ContextCategory::ALL {
        let tokens = current[&cat];
        let target_share = targets.get(&cat).copied().unwrap_or(0.0);
        let observed_share = tokens as f64 / total as f64;
        let target_tokens = target_share * total as f64;

        let new_tokens = if observed_share > target_share * OVER_FACTOR {
            let reduced = (tokens as f64 * (1.0 - REDUCE_FRACTION)) as usize;
            notes.push(format!(
                "{} holds {:.0}% of context against a {:.0}% target; reduce by {} tokens",
                cat,
                observed_share * 100.0,
                target_share * 100.0,
                tokens - reduced
            ));
            reduced
        } else if observed_share < target_share * UNDER_FACTOR {
            let grown =
                (tokens as f64 + (target_tokens - tokens as f64) * GROW_FRACTION) as usize;
            notes.push(format!(
                "{} holds {:.0}% of context against a {:.0}% target; grow by {} tokens",
                cat,
                observed_share * 100.0,
                target_share * 100.0,
                grown - tokens
            ));
            grown
        } else {
            tokens
        };

        recommended.insert(cat, new_tokens);
        change.insert(cat, new_tokens as i64 - tokens as i64);
    }

    let rationale = if notes.is_empty() {
        "Current allocation is well-balanced.".to_string()
    } else {
        notes.join("; ")
    };

    AllocationAdvice {
        current_allocation: current,
        recommended_allocation: recommended,
        expected_change: change,
        rationale,
    }
}
