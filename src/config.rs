//! Unified configuration for gauge, read from `gauge.toml`.
//!
//! All sections are optional; missing values fall back to the built-in
//! defaults so an empty file (or no file at all) yields a working setup.
//!
//! # Configuration File Format
//!
//! ```toml
//! [store]
//! max_tokens = 200000
//! min_intake_importance = 0.8
//! estimator = "char-count"
//!
//! [monitor]
//! interval_secs = 5.0
//! enable_auto_actions = true
//!
//! [[thresholds]]
//! level = "warning"
//! utilization = 0.6
//! actions = ["log"]
//! cooldown_secs = 300
//!
//! [targets]
//! foundation = 0.15
//! "agent-output" = 0.50
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::compress::{CharCountEstimator, TokenEstimator, WordCountEstimator};
use crate::context::{ContextCategory, ContextStore, DEFAULT_MIN_INTAKE_IMPORTANCE};
use crate::monitor::{
    AlertLevel, BudgetThreshold, MonitorConfig, RemediationAction, default_targets,
    default_thresholds,
};

/// Name of the configuration file searched in the working directory.
pub const CONFIG_FILE_NAME: &str = "gauge.toml";

/// Default context budget in tokens (a 200k-token model window).
pub const DEFAULT_MAX_TOKENS: usize = 200_000;

/// Default interval between background checks, in seconds.
pub const DEFAULT_INTERVAL_SECS: f64 = 5.0;

/// Token estimation strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimatorKind {
    /// ~4 characters per token.
    #[default]
    CharCount,
    /// ~1.3 tokens per word.
    WordCount,
}

impl EstimatorKind {
    pub fn build(&self) -> Box<dyn TokenEstimator + Send + Sync> {
        match self {
            EstimatorKind::CharCount => Box::new(CharCountEstimator::default()),
            EstimatorKind::WordCount => Box::new(WordCountEstimator::default()),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_min_intake_importance")]
    pub min_intake_importance: f64,
    #[serde(default)]
    pub estimator: EstimatorKind,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            min_intake_importance: default_min_intake_importance(),
            estimator: EstimatorKind::default(),
        }
    }
}

/// `[monitor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    #[serde(default = "default_true")]
    pub enable_auto_actions: bool,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            enable_auto_actions: true,
        }
    }
}

/// One `[[thresholds]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSection {
    pub level: AlertLevel,
    pub utilization: f64,
    pub actions: Vec<RemediationAction>,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

/// The parsed `gauge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeToml {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub monitor: MonitorSection,
    #[serde(default = "default_threshold_sections")]
    pub thresholds: Vec<ThresholdSection>,
    #[serde(default = "default_target_shares")]
    pub targets: BTreeMap<ContextCategory, f64>,
}

impl Default for GaugeToml {
    fn default() -> Self {
        Self {
            store: StoreSection::default(),
            monitor: MonitorSection::default(),
            thresholds: default_threshold_sections(),
            targets: default_target_shares(),
        }
    }
}

impl GaugeToml {
    /// Load configuration from a specific file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: GaugeToml = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load `gauge.toml` from a directory, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Collect every validation problem; an empty list means valid.
    pub fn validation_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.store.max_tokens == 0 {
            issues.push("store.max_tokens must be greater than zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.store.min_intake_importance) {
            issues.push(format!(
                "store.min_intake_importance {} is outside [0, 1]",
                self.store.min_intake_importance
            ));
        }
        if self.monitor.interval_secs <= 0.0 {
            issues.push(format!(
                "monitor.interval_secs {} must be positive",
                self.monitor.interval_secs
            ));
        }

        if self.thresholds.is_empty() {
            issues.push("at least one threshold tier is required".to_string());
        }
        let mut seen_levels = Vec::new();
        for tier in &self.thresholds {
            if tier.level == AlertLevel::Info {
                issues.push("threshold level 'info' is reserved for the all-clear state".to_string());
            }
            if !(tier.utilization > 0.0 && tier.utilization <= 1.0) {
                issues.push(format!(
                    "threshold utilization {} for '{}' is outside (0, 1]",
                    tier.utilization, tier.level
                ));
            }
            if tier.actions.is_empty() {
                issues.push(format!("threshold '{}' has no actions", tier.level));
            }
            if seen_levels.contains(&tier.level) {
                issues.push(format!("duplicate threshold level '{}'", tier.level));
            }
            seen_levels.push(tier.level);
        }

        let share_sum: f64 = self.targets.values().sum();
        for (cat, share) in &self.targets {
            if !(0.0..=1.0).contains(share) {
                issues.push(format!("target share {} for '{}' is outside [0, 1]", share, cat));
            }
        }
        if !self.targets.is_empty() && !(0.99..=1.01).contains(&share_sum) {
            issues.push(format!("target shares sum to {:.2}, expected 1.00", share_sum));
        }

        issues
    }

    /// Validate, failing on the first collected issue.
    pub fn validate(&self) -> Result<()> {
        let issues = self.validation_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid configuration: {}", issues.join("; "))
        }
    }

    /// Convert to the monitor's runtime configuration.
    pub fn to_monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_secs_f64(self.monitor.interval_secs.max(0.0)),
            enable_auto_actions: self.monitor.enable_auto_actions,
            thresholds: self
                .thresholds
                .iter()
                .map(|t| BudgetThreshold {
                    level: t.level,
                    utilization: t.utilization,
                    actions: t.actions.clone(),
                    cooldown: Duration::from_secs(t.cooldown_secs),
                })
                .collect(),
            targets: self.targets.clone(),
        }
    }

    /// Build a context store per the `[store]` section.
    pub fn build_store(&self) -> ContextStore {
        let mut store =
            ContextStore::with_estimator(self.store.max_tokens, self.store.estimator.build());
        store.set_min_intake_importance(self.store.min_intake_importance);
        store
    }

    /// The default configuration rendered as a commented TOML file.
    pub fn default_file_contents() -> String {
        format!(
            r#"# gauge configuration

[store]
# Context budget in tokens.
max_tokens = {max_tokens}
# While intake is blocked, additions below this importance are rejected.
min_intake_importance = {min_importance}
# Token estimation: "char-count" (~4 chars/token) or "word-count" (~1.3 tokens/word).
estimator = "char-count"

[monitor]
# Seconds between background budget checks.
interval_secs = {interval}
# Run each tier's remediation actions automatically when it fires.
enable_auto_actions = true

# Escalation tiers, evaluated from the highest utilization downward.
# Available actions: log, compress-low-priority, compress-aggressive,
# block-new-content, emergency-cleanup.

[[thresholds]]
level = "warning"
utilization = 0.6
actions = ["log"]
cooldown_secs = 300

[[thresholds]]
level = "critical"
utilization = 0.8
actions = ["log", "compress-low-priority"]
cooldown_secs = 120

[[thresholds]]
level = "emergency"
utilization = 0.95
actions = ["log", "compress-aggressive", "block-new-content"]
cooldown_secs = 60

# Target share of the budget per category, for allocation advice.
[targets]
foundation = 0.15
"agent-output" = 0.50
template = 0.20
metadata = 0.10
debug = 0.03
temporary = 0.02
"#,
            max_tokens = DEFAULT_MAX_TOKENS,
            min_importance = DEFAULT_MIN_INTAKE_IMPORTANCE,
            interval = DEFAULT_INTERVAL_SECS,
        )
    }
}

fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

fn default_min_intake_importance() -> f64 {
    DEFAULT_MIN_INTAKE_IMPORTANCE
}

fn default_interval_secs() -> f64 {
    DEFAULT_INTERVAL_SECS
}

fn default_true() -> bool {
    true
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_threshold_sections() -> Vec<ThresholdSection> {
    default_thresholds()
        .into_iter()
        .map(|t| ThresholdSection {
            level: t.level,
            utilization: t.utilization,
            actions: t.actions,
            cooldown_secs: t.cooldown.as_secs(),
        })
        .collect()
}

fn default_target_shares() -> BTreeMap<ContextCategory, f64> {
    default_targets()
}
