//! Alert levels, remediation actions, and the tiered threshold table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default warning tier: log only.
pub const DEFAULT_WARNING_UTILIZATION: f64 = 0.60;
pub const DEFAULT_WARNING_COOLDOWN_SECS: u64 = 300;

/// Default critical tier: log and compress low-priority items.
pub const DEFAULT_CRITICAL_UTILIZATION: f64 = 0.80;
pub const DEFAULT_CRITICAL_COOLDOWN_SECS: u64 = 120;

/// Default emergency tier: log, compress aggressively, block new intake.
pub const DEFAULT_EMERGENCY_UTILIZATION: f64 = 0.95;
pub const DEFAULT_EMERGENCY_COOLDOWN_SECS: u64 = 60;

/// Severity of a budget alert, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
            AlertLevel::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A remediation step attached to a threshold tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationAction {
    /// Emit the alert through the logging facility.
    Log,
    /// Compress a handful of unimportant, uncompressed items.
    CompressLowPriority,
    /// Compress everything below high importance except Foundation content.
    CompressAggressive,
    /// Block further intake of low-importance content.
    BlockNewContent,
    /// Remove Temporary and Debug items outright.
    EmergencyCleanup,
}

impl RemediationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemediationAction::Log => "log",
            RemediationAction::CompressLowPriority => "compress-low-priority",
            RemediationAction::CompressAggressive => "compress-aggressive",
            RemediationAction::BlockNewContent => "block-new-content",
            RemediationAction::EmergencyCleanup => "emergency-cleanup",
        }
    }
}

impl std::fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tier of the escalation table.
#[derive(Debug, Clone)]
pub struct BudgetThreshold {
    pub level: AlertLevel,
    /// Minimum utilization fraction that activates this tier.
    pub utilization: f64,
    /// Remediation actions, executed in order when the tier fires.
    pub actions: Vec<RemediationAction>,
    /// Minimum interval between two alerts of this level.
    pub cooldown: Duration,
}

/// The standard three-tier escalation table.
pub fn default_thresholds() -> Vec<BudgetThreshold> {
    vec![
        BudgetThreshold {
            level: AlertLevel::Warning,
            utilization: DEFAULT_WARNING_UTILIZATION,
            actions: vec![RemediationAction::Log],
            cooldown: Duration::from_secs(DEFAULT_WARNING_COOLDOWN_SECS),
        },
        BudgetThreshold {
            level: AlertLevel::Critical,
            utilization: DEFAULT_CRITICAL_UTILIZATION,
            actions: vec![
                RemediationAction::Log,
                RemediationAction::CompressLowPriority,
            ],
            cooldown: Duration::from_secs(DEFAULT_CRITICAL_COOLDOWN_SECS),
        },
        BudgetThreshold {
            level: AlertLevel::Emergency,
            utilization: DEFAULT_EMERGENCY_UTILIZATION,
            actions: vec![
                RemediationAction::Log,
                RemediationAction::CompressAggressive,
                RemediationAction::BlockNewContent,
            ],
            cooldown: Duration::from_secs(DEFAULT_EMERGENCY_COOLDOWN_SECS),
        },
    ]
}

/// Order tiers for evaluation: highest utilization threshold first, so the
/// first match is the most severe tier the current utilization reaches.
pub fn sort_for_evaluation(thresholds: &mut [BudgetThreshold]) {
    thresholds.sort_by(|a, b| {
        b.utilization
            .partial_cmp(&a.utilization)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Select the active tier for a utilization value, if any.
///
/// `thresholds` must already be sorted by [`sort_for_evaluation`].
pub fn select_tier(
    thresholds: &[BudgetThreshold],
    utilization: f64,
) -> Option<&BudgetThreshold> {
    thresholds.iter().find(|t| utilization >= t.utilization)
}
