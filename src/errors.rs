//! Typed error hierarchy for the gauge subsystems.
//!
//! Three enums cover the three subsystems:
//! - `StoreError` — context store intake and access failures
//! - `CompressError` — compression engine failures
//! - `ActionError` — remediation action failures inside the budget monitor

use thiserror::Error;

use crate::context::ItemId;

/// Errors from the context store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error(
        "Intake blocked: importance {importance:.2} is below the minimum {min_importance:.2} accepted under budget pressure"
    )]
    IntakeBlocked {
        importance: f64,
        min_importance: f64,
    },

    #[error("Importance {0} is outside [0, 1]")]
    InvalidImportance(f64),

    #[error("No item {0} in store")]
    ItemNotFound(ItemId),
}

/// Errors from the compression engine.
#[derive(Debug, Clone, Error)]
pub enum CompressError {
    #[error("Target ratio {0} must be within (0, 1)")]
    InvalidRatio(f64),

    #[error("Item {0} has no compressible content")]
    EmptyContent(ItemId),

    #[error("Compression backend error: {0}")]
    Backend(String),
}

/// Errors from a single remediation action.
///
/// Action failures are collected by the monitor and logged; they never
/// propagate out of a budget check.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("Context store lock poisoned")]
    StorePoisoned,

    #[error("Compression failed: {0}")]
    Compression(#[from] CompressError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
