//! Context items and their semantic categories.

use serde::{Deserialize, Serialize};

/// Identifier for an item within a store, assigned monotonically at intake.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ItemId(pub u64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Semantic category of a context fragment.
///
/// The category drives compression eligibility (Foundation content is never
/// compressed aggressively) and emergency cleanup (only Debug and Temporary
/// items may be removed outright).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ContextCategory {
    /// Load-bearing content (specs, goals); exempt from aggressive compression.
    Foundation,
    /// Output produced by agent phases.
    AgentOutput,
    /// Rendered prompt/report templates.
    Template,
    /// Bookkeeping about the run itself.
    Metadata,
    /// Diagnostic output; removable under pressure.
    Debug,
    /// Scratch content; removable under pressure.
    Temporary,
}

impl ContextCategory {
    /// All categories, in display order.
    pub const ALL: [ContextCategory; 6] = [
        ContextCategory::Foundation,
        ContextCategory::AgentOutput,
        ContextCategory::Template,
        ContextCategory::Metadata,
        ContextCategory::Debug,
        ContextCategory::Temporary,
    ];

    /// Whether emergency cleanup may remove items of this category.
    pub fn is_disposable(&self) -> bool {
        matches!(self, ContextCategory::Debug | ContextCategory::Temporary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextCategory::Foundation => "foundation",
            ContextCategory::AgentOutput => "agent-output",
            ContextCategory::Template => "template",
            ContextCategory::Metadata => "metadata",
            ContextCategory::Debug => "debug",
            ContextCategory::Temporary => "temporary",
        }
    }
}

impl std::fmt::Display for ContextCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContextCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "foundation" => Ok(ContextCategory::Foundation),
            "agent-output" | "agent_output" => Ok(ContextCategory::AgentOutput),
            "template" => Ok(ContextCategory::Template),
            "metadata" => Ok(ContextCategory::Metadata),
            "debug" => Ok(ContextCategory::Debug),
            "temporary" => Ok(ContextCategory::Temporary),
            other => Err(anyhow::anyhow!("Unknown context category: {}", other)),
        }
    }
}

/// A fragment of model context tracked by the store.
///
/// `token_count` always reflects the current (possibly compressed) content.
/// Items are mutated in place by compression and removed only by emergency
/// cleanup; the store owns them for their whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: ItemId,
    pub content: String,
    pub token_count: usize,
    /// Caller-assigned priority in [0, 1].
    pub importance: f64,
    pub category: ContextCategory,
    /// True once compression has been applied at least once.
    pub compressed: bool,
    /// Post- to pre-compression token ratio, set on first compression.
    pub compression_ratio: Option<f64>,
    /// Free-text provenance tag (which caller added the item).
    pub source: String,
}

impl ContextItem {
    /// Replace the content with a compressed version, recording the ratio
    /// on first compression. Returns the tokens saved.
    pub fn apply_compression(&mut self, content: String, token_count: usize) -> usize {
        let saved = self.token_count.saturating_sub(token_count);
        if !self.compressed {
            self.compression_ratio =
                Some(token_count as f64 / self.token_count.max(1) as f64);
            self.compressed = true;
        }
        self.content = content;
        self.token_count = token_count;
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(tokens: usize) -> ContextItem {
        ContextItem {
            id: ItemId(1),
            content: "x".repeat(tokens * 4),
            token_count: tokens,
            importance: 0.5,
            category: ContextCategory::AgentOutput,
            compressed: false,
            compression_ratio: None,
            source: "test".to_string(),
        }
    }

    #[test]
    fn category_round_trips_through_as_str() {
        for cat in ContextCategory::ALL {
            assert_eq!(ContextCategory::from_str(cat.as_str()).unwrap(), cat);
        }
    }

    #[test]
    fn category_from_str_accepts_underscore_variant() {
        assert_eq!(
            ContextCategory::from_str("agent_output").unwrap(),
            ContextCategory::AgentOutput
        );
    }

    #[test]
    fn category_from_str_rejects_unknown() {
        assert!(ContextCategory::from_str("mystery").is_err());
    }

    #[test]
    fn only_debug_and_temporary_are_disposable() {
        assert!(ContextCategory::Debug.is_disposable());
        assert!(ContextCategory::Temporary.is_disposable());
        assert!(!ContextCategory::Foundation.is_disposable());
        assert!(!ContextCategory::AgentOutput.is_disposable());
        assert!(!ContextCategory::Template.is_disposable());
        assert!(!ContextCategory::Metadata.is_disposable());
    }

    #[test]
    fn apply_compression_records_ratio_once() {
        let mut it = item(100);
        let saved = it.apply_compression("short".to_string(), 60);
        assert_eq!(saved, 40);
        assert!(it.compressed);
        assert_eq!(it.token_count, 60);
        let first_ratio = it.compression_ratio.unwrap();
        assert!((first_ratio - 0.6).abs() < 1e-9);

        // A second compression keeps the original ratio.
        let saved2 = it.apply_compression("s".to_string(), 30);
        assert_eq!(saved2, 30);
        assert_eq!(it.compression_ratio.unwrap(), first_ratio);
    }

    #[test]
    fn apply_compression_with_growth_saves_nothing() {
        let mut it = item(10);
        let saved = it.apply_compression("much longer content".to_string(), 15);
        assert_eq!(saved, 0);
        assert_eq!(it.token_count, 15);
    }

    #[test]
    fn category_serde_uses_kebab_case() {
        let json = serde_json::to_string(&ContextCategory::AgentOutput).unwrap();
        assert_eq!(json, "\"agent-output\"");
        let parsed: ContextCategory = serde_json::from_str("\"temporary\"").unwrap();
        assert_eq!(parsed, ContextCategory::Temporary);
    }
}
