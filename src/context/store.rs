//! In-memory context store shared between content producers and the monitor.

use std::collections::BTreeMap;

use serde::Serialize;

use super::item::{ContextCategory, ContextItem, ItemId};
use crate::compress::{CharCountEstimator, CompressionOutcome, TokenEstimator};
use crate::errors::StoreError;

/// Default minimum importance accepted while intake is blocked.
pub const DEFAULT_MIN_INTAKE_IMPORTANCE: f64 = 0.8;

/// Aggregate view of the store, read by the monitor on every check.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub total_tokens: usize,
    /// `total_tokens / max_tokens`; may exceed 1.0 when over budget.
    pub budget_utilization: f64,
    pub total_items: usize,
    pub tokens_by_category: BTreeMap<ContextCategory, usize>,
}

/// Ordered collection of context fragments with a fixed token budget.
///
/// The store is shared as `Arc<Mutex<ContextStore>>` between the callers
/// adding content and the budget monitor's remediation actions. It keeps a
/// running token total so summary reads stay cheap; compression savings are
/// debited by the monitor through [`ContextStore::debit_tokens`].
pub struct ContextStore {
    max_tokens: usize,
    items: Vec<ContextItem>,
    current_token_count: usize,
    next_id: u64,
    intake_blocked: bool,
    min_intake_importance: f64,
    estimator: Box<dyn TokenEstimator + Send + Sync>,
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore")
            .field("max_tokens", &self.max_tokens)
            .field("items", &self.items.len())
            .field("current_token_count", &self.current_token_count)
            .field("intake_blocked", &self.intake_blocked)
            .field("estimator", &self.estimator.name())
            .finish()
    }
}

impl ContextStore {
    /// Create a store with the given token budget and the default
    /// character-count estimator.
    pub fn new(max_tokens: usize) -> Self {
        Self::with_estimator(max_tokens, Box::new(CharCountEstimator::default()))
    }

    /// Create a store with a specific token estimator.
    pub fn with_estimator(
        max_tokens: usize,
        estimator: Box<dyn TokenEstimator + Send + Sync>,
    ) -> Self {
        Self {
            max_tokens,
            items: Vec::new(),
            current_token_count: 0,
            next_id: 1,
            intake_blocked: false,
            min_intake_importance: DEFAULT_MIN_INTAKE_IMPORTANCE,
            estimator,
        }
    }

    /// Set the importance floor applied while intake is blocked.
    pub fn set_min_intake_importance(&mut self, min: f64) {
        self.min_intake_importance = min;
    }

    /// Add a content fragment to the store.
    ///
    /// Token count is estimated from the content. While intake is blocked,
    /// additions below the minimum importance are rejected with
    /// [`StoreError::IntakeBlocked`].
    pub fn add_content(
        &mut self,
        content: impl Into<String>,
        category: ContextCategory,
        importance: f64,
        source: impl Into<String>,
    ) -> Result<ItemId, StoreError> {
        if !(0.0..=1.0).contains(&importance) {
            return Err(StoreError::InvalidImportance(importance));
        }
        if self.intake_blocked && importance < self.min_intake_importance {
            return Err(StoreError::IntakeBlocked {
                importance,
                min_importance: self.min_intake_importance,
            });
        }

        let content = content.into();
        let token_count = self.estimator.estimate(&content);
        let id = ItemId(self.next_id);
        self.next_id += 1;

        self.items.push(ContextItem {
            id,
            content,
            token_count,
            importance,
            category,
            compressed: false,
            compression_ratio: None,
            source: source.into(),
        });
        self.current_token_count += token_count;
        Ok(id)
    }

    /// Aggregate summary for budget checks.
    pub fn get_summary(&self) -> StoreSummary {
        let mut tokens_by_category = BTreeMap::new();
        for item in &self.items {
            *tokens_by_category.entry(item.category).or_insert(0) += item.token_count;
        }
        StoreSummary {
            total_tokens: self.current_token_count,
            budget_utilization: self.utilization(),
            total_items: self.items.len(),
            tokens_by_category,
        }
    }

    /// Current utilization as a fraction of the budget. A zero budget reads
    /// as fully used.
    pub fn utilization(&self) -> f64 {
        if self.max_tokens == 0 {
            return 1.0;
        }
        self.current_token_count as f64 / self.max_tokens as f64
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn current_token_count(&self) -> usize {
        self.current_token_count
    }

    /// Read-only access to the backing collection, in insertion order.
    pub fn items(&self) -> &[ContextItem] {
        &self.items
    }

    /// Apply a compression outcome to one item, returning the tokens saved.
    ///
    /// The running total is not adjusted here; the monitor debits the exact
    /// savings through [`ContextStore::debit_tokens`] after an action pass.
    pub fn apply_compression(
        &mut self,
        id: ItemId,
        outcome: &CompressionOutcome,
    ) -> Result<usize, StoreError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::ItemNotFound(id))?;
        Ok(item.apply_compression(outcome.content.clone(), outcome.token_count))
    }

    /// Decrement the running token total by compression savings.
    pub fn debit_tokens(&mut self, saved: usize) {
        self.current_token_count = self.current_token_count.saturating_sub(saved);
    }

    /// Remove every item matching the predicate, keeping the rest in order.
    ///
    /// Returns `(items_removed, tokens_freed)`. Unlike compression, removal
    /// adjusts the running total itself.
    pub fn remove_matching<F>(&mut self, pred: F) -> (usize, usize)
    where
        F: Fn(&ContextItem) -> bool,
    {
        let before = self.items.len();
        let mut freed = 0usize;
        self.items.retain(|item| {
            if pred(item) {
                freed += item.token_count;
                false
            } else {
                true
            }
        });
        self.current_token_count = self.current_token_count.saturating_sub(freed);
        (before - self.items.len(), freed)
    }

    /// Toggle the intake block consulted by `add_content`.
    pub fn set_intake_blocked(&mut self, blocked: bool) {
        self.intake_blocked = blocked;
    }

    pub fn intake_blocked(&self) -> bool {
        self.intake_blocked
    }

    pub fn min_intake_importance(&self) -> f64 {
        self.min_intake_importance
    }
}
