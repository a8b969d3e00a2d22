//! Remediation action execution against the shared context store.
//!
//! Actions run best-effort: each produces a typed result collected by the
//! monitor, and a failure never aborts the remaining actions of a tier.
//! Savings already applied before a failure stay applied, and the store's
//! running total is always debited by exactly the tokens saved.

use std::sync::Mutex;

use serde::Serialize;

use super::alert::BudgetAlert;
use super::thresholds::{AlertLevel, RemediationAction};
use crate::compress::{CompressionPlan, CompressionStrategy, Compressor};
use crate::context::{ContextCategory, ContextStore};
use crate::errors::ActionError;

/// Cap on items touched by one low-priority compression pass.
const LOW_PRIORITY_BATCH: usize = 5;

/// Importance below which an item is eligible for low-priority compression.
const LOW_PRIORITY_CUTOFF: f64 = 0.7;

/// Target ratio for low-priority compression (keep 60% of original size).
const LOW_PRIORITY_TARGET_RATIO: f64 = 0.6;

/// Importance cutoff for aggressive compression.
const AGGRESSIVE_CUTOFF: f64 = 0.9;

/// Overall reduction requested from the recommendation pass.
const AGGRESSIVE_TARGET_REDUCTION: f64 = 0.3;

/// What one successful action accomplished.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub items_affected: usize,
    pub tokens_freed: usize,
}

/// One action's result within a tier, kept for inspection after a check.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub action: RemediationAction,
    pub result: Result<ActionReport, ActionError>,
}

/// Execute a tier's actions in order, collecting per-action results.
///
/// Failures are logged here and returned; they do not stop later actions.
pub fn execute_all(
    actions: &[RemediationAction],
    alert: &BudgetAlert,
    store: &Mutex<ContextStore>,
    compressor: &dyn Compressor,
) -> Vec<ActionOutcome> {
    actions
        .iter()
        .map(|&action| {
            let result = execute_action(action, alert, store, compressor);
            if let Err(err) = &result {
                tracing::warn!("Remediation action '{}' failed: {:#}", action, err);
            }
            ActionOutcome { action, result }
        })
        .collect()
}

/// Execute a single remediation action.
pub fn execute_action(
    action: RemediationAction,
    alert: &BudgetAlert,
    store: &Mutex<ContextStore>,
    compressor: &dyn Compressor,
) -> Result<ActionReport, ActionError> {
    match action {
        RemediationAction::Log => {
            match alert.level {
                AlertLevel::Info => tracing::info!("{}", alert.message),
                AlertLevel::Warning => tracing::warn!("{}", alert.message),
                AlertLevel::Critical | AlertLevel::Emergency => {
                    tracing::error!("{}", alert.message)
                }
            }
            Ok(ActionReport {
                items_affected: 0,
                tokens_freed: 0,
            })
        }
        RemediationAction::CompressLowPriority => {
            let mut guard = store.lock().map_err(|_| ActionError::StorePoisoned)?;
            let plans: Vec<CompressionPlan> = guard
                .items()
                .iter()
                .filter(|i| !i.compressed && i.importance < LOW_PRIORITY_CUTOFF)
                .take(LOW_PRIORITY_BATCH)
                .map(|i| CompressionPlan {
                    item_id: i.id,
                    strategy: CompressionStrategy::default(),
                    target_ratio: LOW_PRIORITY_TARGET_RATIO,
                })
                .collect();
            apply_plans(&mut guard, compressor, plans)
        }
        RemediationAction::CompressAggressive => {
            let mut guard = store.lock().map_err(|_| ActionError::StorePoisoned)?;
            let eligible: Vec<&crate::context::ContextItem> = guard
                .items()
                .iter()
                .filter(|i| {
                    !i.compressed
                        && i.importance < AGGRESSIVE_CUTOFF
                        && i.category != ContextCategory::Foundation
                })
                .collect();
            let plans = compressor.recommendations(&eligible, AGGRESSIVE_TARGET_REDUCTION);
            apply_plans(&mut guard, compressor, plans)
        }
        RemediationAction::BlockNewContent => {
            let mut guard = store.lock().map_err(|_| ActionError::StorePoisoned)?;
            guard.set_intake_blocked(true);
            tracing::error!(
                "Blocking new context intake below importance {:.2} at {:.1}% utilization",
                guard.min_intake_importance(),
                alert.utilization * 100.0
            );
            Ok(ActionReport {
                items_affected: 0,
                tokens_freed: 0,
            })
        }
        RemediationAction::EmergencyCleanup => {
            let mut guard = store.lock().map_err(|_| ActionError::StorePoisoned)?;
            let (removed, freed) = guard.remove_matching(|i| i.category.is_disposable());
            tracing::warn!(
                "Emergency cleanup removed {} items, freed {} tokens",
                removed,
                freed
            );
            Ok(ActionReport {
                items_affected: removed,
                tokens_freed: freed,
            })
        }
    }
}

/// Run a batch of compression plans, applying only token-reducing outcomes.
///
/// The store total is debited by exactly the accumulated savings, including
/// on the error path, so partial progress is never double-counted.
fn apply_plans(
    store: &mut ContextStore,
    compressor: &dyn Compressor,
    plans: Vec<CompressionPlan>,
) -> Result<ActionReport, ActionError> {
    let mut affected = 0usize;
    let mut freed = 0usize;

    for plan in plans {
        let outcome = {
            let Some(item) = store.items().iter().find(|i| i.id == plan.item_id) else {
                continue;
            };
            match compressor.compress(item, plan.target_ratio, plan.strategy) {
                Ok(outcome) => outcome,
                Err(err) => {
                    store.debit_tokens(freed);
                    return Err(err.into());
                }
            }
        };

        // Strategies that cannot reduce an item report ratio 1.0; skip those.
        if outcome.ratio < 1.0 {
            match store.apply_compression(plan.item_id, &outcome) {
                Ok(saved) => {
                    affected += 1;
                    freed += saved;
                }
                Err(err) => {
                    store.debit_tokens(freed);
                    return Err(err.into());
                }
            }
        }
    }

    store.debit_tokens(freed);
    Ok(ActionReport {
        items_affected: affected,
        tokens_freed: freed,
    })
}
