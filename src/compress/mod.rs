//! Context Compression
//!
//! Heuristic, model-free shrinking of context fragments. The budget monitor
//! asks this layer for per-item compression during its remediation actions;
//! the store shares the same token estimator so savings are measured in the
//! same units everywhere.

mod engine;
mod estimator;

pub use engine::{
    CompressionOutcome, CompressionPlan, CompressionStrategy, Compressor,
    HeuristicCompressor,
};
pub use estimator::{CharCountEstimator, TokenEstimator, WordCountEstimator};
