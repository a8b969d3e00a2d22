//! Heuristic content compression.
//!
//! The engine shrinks an item's content toward a target ratio without any
//! model call: whitespace folding for padded output, head/tail elision for
//! long transcripts, hard truncation as the blunt fallback. Output is never
//! larger than the input; when a strategy cannot reduce the content the
//! original is returned unchanged with ratio 1.0.

use serde::{Deserialize, Serialize};

use super::estimator::{CharCountEstimator, TokenEstimator};
use crate::context::{ContextItem, ItemId};
use crate::errors::CompressError;

/// Fraction of the target kept at the head by head/tail elision.
const HEAD_SHARE: f64 = 0.7;

/// Token count above which the recommendation pass prefers head/tail elision.
const LONG_ITEM_TOKENS: usize = 1_500;

/// Whitespace share above which the recommendation pass prefers folding.
const WHITESPACE_HEAVY_SHARE: f64 = 0.15;

/// Ratio bounds for recommended per-item targets.
const MIN_TARGET_RATIO: f64 = 0.3;
const MAX_TARGET_RATIO: f64 = 0.9;

/// Extra ratio squeeze applied to items above the eligible-set average.
const LARGE_ITEM_SQUEEZE: f64 = 0.1;

/// How an item's content is shrunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionStrategy {
    /// Collapse runs of blanks and padded lines.
    WhitespaceFold,
    /// Keep the head and tail, elide the middle.
    HeadTail,
    /// Hard cut at the target size.
    Truncate,
}

impl Default for CompressionStrategy {
    fn default() -> Self {
        CompressionStrategy::HeadTail
    }
}

impl CompressionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionStrategy::WhitespaceFold => "whitespace-fold",
            CompressionStrategy::HeadTail => "head-tail",
            CompressionStrategy::Truncate => "truncate",
        }
    }
}

impl std::fmt::Display for CompressionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of compressing one item.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    /// The shrunk content.
    pub content: String,
    /// Token estimate of the shrunk content.
    pub token_count: usize,
    /// Post- to pre-compression token ratio (1.0 when nothing was saved).
    pub ratio: f64,
}

/// Per-item plan produced by the recommendation pass.
#[derive(Debug, Clone)]
pub struct CompressionPlan {
    pub item_id: ItemId,
    pub strategy: CompressionStrategy,
    pub target_ratio: f64,
}

/// Compression backend consumed by the budget monitor's actions.
pub trait Compressor: Send + Sync {
    /// Shrink an item's content toward `target_ratio` of its current size.
    fn compress(
        &self,
        item: &ContextItem,
        target_ratio: f64,
        strategy: CompressionStrategy,
    ) -> Result<CompressionOutcome, CompressError>;

    /// Propose a `(strategy, ratio)` per item aiming at an overall
    /// `target_reduction` across the eligible set.
    fn recommendations(
        &self,
        items: &[&ContextItem],
        target_reduction: f64,
    ) -> Vec<CompressionPlan>;
}

/// Default lossy compressor with no external dependencies.
pub struct HeuristicCompressor {
    estimator: Box<dyn TokenEstimator + Send + Sync>,
}

impl Default for HeuristicCompressor {
    fn default() -> Self {
        Self {
            estimator: Box::new(CharCountEstimator::default()),
        }
    }
}

impl HeuristicCompressor {
    pub fn new(estimator: Box<dyn TokenEstimator + Send + Sync>) -> Self {
        Self { estimator }
    }

    fn shrink(content: &str, target_chars: usize, strategy: CompressionStrategy) -> String {
        match strategy {
            CompressionStrategy::WhitespaceFold => {
                let folded = fold_whitespace(content);
                if folded.chars().count() > target_chars {
                    head_tail(&folded, target_chars)
                } else {
                    folded
                }
            }
            CompressionStrategy::HeadTail => head_tail(content, target_chars),
            CompressionStrategy::Truncate => truncate(content, target_chars),
        }
    }
}

impl Compressor for HeuristicCompressor {
    fn compress(
        &self,
        item: &ContextItem,
        target_ratio: f64,
        strategy: CompressionStrategy,
    ) -> Result<CompressionOutcome, CompressError> {
        if !(target_ratio > 0.0 && target_ratio < 1.0) {
            return Err(CompressError::InvalidRatio(target_ratio));
        }
        if item.content.trim().is_empty() {
            return Err(CompressError::EmptyContent(item.id));
        }

        let original_chars = item.content.chars().count();
        let target_chars = ((original_chars as f64) * target_ratio) as usize;
        let shrunk = Self::shrink(&item.content, target_chars, strategy);
        let token_count = self.estimator.estimate(&shrunk);

        // Never hand back something larger than the original.
        if token_count >= item.token_count {
            return Ok(CompressionOutcome {
                content: item.content.clone(),
                token_count: item.token_count,
                ratio: 1.0,
            });
        }

        Ok(CompressionOutcome {
            ratio: token_count as f64 / item.token_count.max(1) as f64,
            content: shrunk,
            token_count,
        })
    }

    fn recommendations(
        &self,
        items: &[&ContextItem],
        target_reduction: f64,
    ) -> Vec<CompressionPlan> {
        if items.is_empty() {
            return Vec::new();
        }

        let total_tokens: usize = items.iter().map(|i| i.token_count).sum();
        let mean_tokens = total_tokens as f64 / items.len() as f64;
        let base_ratio =
            (1.0 - target_reduction).clamp(MIN_TARGET_RATIO, MAX_TARGET_RATIO);

        items
            .iter()
            .map(|item| {
                let strategy = if whitespace_share(&item.content) > WHITESPACE_HEAVY_SHARE {
                    CompressionStrategy::WhitespaceFold
                } else if item.token_count > LONG_ITEM_TOKENS {
                    CompressionStrategy::HeadTail
                } else {
                    CompressionStrategy::Truncate
                };

                // Squeeze oversized items harder so the overall reduction lands.
                let target_ratio = if (item.token_count as f64) > mean_tokens {
                    (base_ratio - LARGE_ITEM_SQUEEZE).max(MIN_TARGET_RATIO)
                } else {
                    base_ratio
                };

                CompressionPlan {
                    item_id: item.id,
                    strategy,
                    target_ratio,
                }
            })
            .collect()
    }
}

/// Collapse runs of spaces and tabs, and squeeze blank-line runs to one.
fn fold_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut blank_run = 0usize;
    for line in content.lines() {
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            out.push('\n');
            continue;
        }
        blank_run = 0;

        let mut in_gap = false;
        for ch in trimmed.chars() {
            if ch == ' ' || ch == '\t' {
                if !in_gap {
                    out.push(' ');
                }
                in_gap = true;
            } else {
                in_gap = false;
                out.push(ch);
            }
        }
        out.push('\n');
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Keep the head and tail of the content, eliding the middle.
fn head_tail(content: &str, target_chars: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= target_chars || target_chars == 0 {
        return content.to_string();
    }

    let head = ((target_chars as f64) * HEAD_SHARE) as usize;
    let tail = target_chars.saturating_sub(head);
    let elided = chars.len() - head - tail;

    let head_str: String = chars[..head].iter().collect();
    let tail_str: String = chars[chars.len() - tail..].iter().collect();
    format!("{}\n[... {} chars elided ...]\n{}", head_str, elided, tail_str)
}

/// Hard cut at the target size with a marker.
fn truncate(content: &str, target_chars: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= target_chars {
        return content.to_string();
    }
    let kept: String = chars[..target_chars].iter().collect();
    format!("{}\n[truncated]", kept)
}

/// Fraction of the content that is whitespace.
fn whitespace_share(content: &str) -> f64 {
    let total = content.chars().count();
    if total == 0 {
        return 0.0;
    }
    let ws = content.chars().filter(|c| c.is_whitespace()).count();
    ws as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextCategory;

    fn item(id: u64, content: &str) -> ContextItem {
        let est = CharCountEstimator::default();
        ContextItem {
            id: ItemId(id),
            token_count: est.estimate(content),
            content: content.to_string(),
            importance: 0.5,
            category: ContextCategory::AgentOutput,
            compressed: false,
            compression_ratio: None,
            source: "test".to_string(),
        }
    }

    // ----------------------------------------------------------------
    // compress
    // ----------------------------------------------------------------

    #[test]
    fn compress_reduces_long_content() {
        let comp = HeuristicCompressor::default();
        let it = item(1, &"the quick brown fox. ".repeat(100));

        let out = comp
            .compress(&it, 0.5, CompressionStrategy::HeadTail)
            .unwrap();
        assert!(out.token_count < it.token_count);
        assert!(out.ratio < 1.0);
        assert!(out.content.contains("elided"));
    }

    #[test]
    fn compress_never_grows_content() {
        let comp = HeuristicCompressor::default();
        // Tiny content: any strategy's marker overhead would grow it.
        let it = item(1, "short");
        let out = comp
            .compress(&it, 0.5, CompressionStrategy::HeadTail)
            .unwrap();
        assert_eq!(out.content, "short");
        assert_eq!(out.token_count, it.token_count);
        assert_eq!(out.ratio, 1.0);
    }

    #[test]
    fn compress_rejects_bad_ratio() {
        let comp = HeuristicCompressor::default();
        let it = item(1, "content here");
        assert!(matches!(
            comp.compress(&it, 0.0, CompressionStrategy::Truncate),
            Err(CompressError::InvalidRatio(_))
        ));
        assert!(matches!(
            comp.compress(&it, 1.0, CompressionStrategy::Truncate),
            Err(CompressError::InvalidRatio(_))
        ));
    }

    #[test]
    fn compress_rejects_empty_content() {
        let comp = HeuristicCompressor::default();
        let it = item(7, "   \n  ");
        assert!(matches!(
            comp.compress(&it, 0.5, CompressionStrategy::Truncate),
            Err(CompressError::EmptyContent(ItemId(7)))
        ));
    }

    #[test]
    fn truncate_strategy_cuts_to_target() {
        let comp = HeuristicCompressor::default();
        let it = item(1, &"abcdefgh".repeat(100)); // 800 chars, 200 tokens
        let out = comp
            .compress(&it, 0.5, CompressionStrategy::Truncate)
            .unwrap();
        assert!(out.content.ends_with("[truncated]"));
        // 400 chars kept + marker ≈ 103 tokens
        assert!(out.token_count <= 110);
    }

    #[test]
    fn whitespace_fold_collapses_padding() {
        let comp = HeuristicCompressor::default();
        let padded = "word    word\t\tword\n\n\n\n\nword      word\n".repeat(40);
        let it = item(1, &padded);
        let out = comp
            .compress(&it, 0.9, CompressionStrategy::WhitespaceFold)
            .unwrap();
        assert!(out.token_count < it.token_count);
        assert!(!out.content.contains("    "));
    }

    // ----------------------------------------------------------------
    // recommendations
    // ----------------------------------------------------------------

    #[test]
    fn recommendations_empty_input_yields_empty_plan() {
        let comp = HeuristicCompressor::default();
        assert!(comp.recommendations(&[], 0.3).is_empty());
    }

    #[test]
    fn recommendations_cover_every_item() {
        let comp = HeuristicCompressor::default();
        let a = item(1, &"a".repeat(400));
        let b = item(2, &"b".repeat(8_000));
        let plans = comp.recommendations(&[&a, &b], 0.3);

        assert_eq!(plans.len(), 2);
        assert!(plans.iter().any(|p| p.item_id == ItemId(1)));
        assert!(plans.iter().any(|p| p.item_id == ItemId(2)));
        for p in &plans {
            assert!(p.target_ratio >= MIN_TARGET_RATIO);
            assert!(p.target_ratio <= MAX_TARGET_RATIO);
        }
    }

    #[test]
    fn recommendations_squeeze_oversized_items_harder() {
        let comp = HeuristicCompressor::default();
        let small = item(1, &"a".repeat(100));
        let large = item(2, &"b".repeat(10_000));
        let plans = comp.recommendations(&[&small, &large], 0.3);

        let small_plan = plans.iter().find(|p| p.item_id == ItemId(1)).unwrap();
        let large_plan = plans.iter().find(|p| p.item_id == ItemId(2)).unwrap();
        assert!(large_plan.target_ratio < small_plan.target_ratio);
    }

    #[test]
    fn recommendations_pick_head_tail_for_long_items() {
        let comp = HeuristicCompressor::default();
        let long = item(1, &"x".repeat(10_000)); // 2500 tokens
        let plans = comp.recommendations(&[&long], 0.3);
        assert_eq!(plans[0].strategy, CompressionStrategy::HeadTail);
    }

    #[test]
    fn recommendations_pick_fold_for_whitespace_heavy_items() {
        let comp = HeuristicCompressor::default();
        let airy = item(1, &"word    \n\n\n   word\n".repeat(50));
        let plans = comp.recommendations(&[&airy], 0.3);
        assert_eq!(plans[0].strategy, CompressionStrategy::WhitespaceFold);
    }

    // ----------------------------------------------------------------
    // helpers
    // ----------------------------------------------------------------

    #[test]
    fn head_tail_preserves_both_ends() {
        let content = format!("{}{}{}", "HEAD", "x".repeat(1_000), "TAIL");
        let out = head_tail(&content, 100);
        assert!(out.starts_with("HEAD"));
        assert!(out.ends_with("TAIL"));
        assert!(out.contains("elided"));
    }

    #[test]
    fn head_tail_short_content_untouched() {
        assert_eq!(head_tail("short", 100), "short");
    }

    #[test]
    fn fold_whitespace_squeezes_blank_runs() {
        let folded = fold_whitespace("a\n\n\n\n\nb");
        assert_eq!(folded, "a\n\nb");
    }
}
