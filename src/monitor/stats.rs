//! Utilization sampling and aggregate monitoring statistics.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::alert::BudgetAlert;
use super::thresholds::AlertLevel;

/// One utilization measurement, recorded on every budget check.
#[derive(Debug, Clone, Serialize)]
pub struct UtilizationSample {
    pub timestamp: DateTime<Utc>,
    pub utilization: f64,
    pub total_tokens: usize,
    pub total_items: usize,
}

/// Aggregate statistics over the recorded sample and alert history.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStats {
    /// Total budget checks that produced a sample.
    pub measurements: usize,
    pub current_utilization: f64,
    pub average_utilization: f64,
    pub peak_utilization: f64,
    pub current_tokens: usize,
    pub average_tokens: f64,
    pub peak_tokens: usize,
    /// Issued alerts per level, over the monitor's lifetime.
    pub alerts_by_level: BTreeMap<AlertLevel, usize>,
    /// The most recent issued alert, if any.
    pub last_alert: Option<BudgetAlert>,
}

/// Compute aggregate statistics from the recorded histories.
pub(crate) fn compute(
    samples: &VecDeque<UtilizationSample>,
    alert_counts: &BTreeMap<AlertLevel, usize>,
    last_alert: Option<BudgetAlert>,
) -> MonitoringStats {
    let measurements = samples.len();
    let (mut sum_util, mut peak_util) = (0.0f64, 0.0f64);
    let (mut sum_tokens, mut peak_tokens) = (0usize, 0usize);

    for sample in samples {
        sum_util += sample.utilization;
        peak_util = peak_util.max(sample.utilization);
        sum_tokens += sample.total_tokens;
        peak_tokens = peak_tokens.max(sample.total_tokens);
    }

    let latest = samples.back();
    MonitoringStats {
        measurements,
        current_utilization: latest.map(|s| s.utilization).unwrap_or(0.0),
        average_utilization: if measurements == 0 {
            0.0
        } else {
            sum_util / measurements as f64
        },
        peak_utilization: peak_util,
        current_tokens: latest.map(|s| s.total_tokens).unwrap_or(0),
        average_tokens: if measurements == 0 {
            0.0
        } else {
            sum_tokens as f64 / measurements as f64
        },
        peak_tokens,
        alerts_by_level: alert_counts.clone(),
        last_alert,
    }
}
