//! Context Item Store
//!
//! This module holds the shared collection of context fragments the budget
//! monitor watches. Each fragment carries a semantic category, an importance
//! score, and a token-count estimate kept in sync with its (possibly
//! compressed) content.
//!
//! ## Intake blocking
//!
//! The store's intake path consults a block flag toggled by the monitor's
//! `block-new-content` remediation action: while blocked, additions below a
//! minimum importance are rejected so only load-bearing content lands while
//! the budget is under pressure.

mod item;
mod store;

pub use item::{ContextCategory, ContextItem, ItemId};
pub use store::{ContextStore, DEFAULT_MIN_INTAKE_IMPORTANCE, StoreSummary};
