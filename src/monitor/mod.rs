//! Context Budget Monitoring
//!
//! This module watches a shared context store against a fixed token budget
//! and escalates through tiered thresholds as utilization climbs.
//!
//! ## Features
//!
//! - **Tiered alerts**: warning, critical, and emergency thresholds with
//!   per-level cooldowns to avoid alert storms
//! - **Automatic remediation**: each tier carries an ordered action list
//!   (log, compress, block intake, emergency cleanup) executed best-effort
//! - **Alert dispatch**: registered handlers are notified synchronously for
//!   every issued alert, with per-handler failure isolation
//! - **Allocation advice**: per-category token shares compared against a
//!   target table, with concrete grow/shrink recommendations
//!
//! ## Usage
//!
//! ```ignore
//! use gauge::context::ContextStore;
//! use gauge::monitor::{BudgetMonitor, MonitorConfig};
//!
//! let store = Arc::new(Mutex::new(ContextStore::new(200_000)));
//! let monitor = BudgetMonitor::new(Arc::clone(&store), MonitorConfig::default());
//!
//! let (level, alert) = monitor.check_budget_status();
//! // or poll in the background:
//! monitor.start_monitoring();
//! ```

mod actions;
mod advisor;
mod alert;
mod budget;
mod stats;
mod thresholds;

pub use actions::{ActionOutcome, ActionReport, execute_action, execute_all};
pub use advisor::{AllocationAdvice, DEFAULT_TARGET_SHARES, advise, default_targets};
pub use alert::{AlertHandler, BudgetAlert, ConsoleAlertHandler, dispatch};
pub use budget::{
    ALERT_HISTORY_CAP, BudgetMonitor, DEFAULT_MONITORING_INTERVAL, MonitorConfig,
    SAMPLE_HISTORY_CAP,
};
pub use stats::{MonitoringStats, UtilizationSample};
pub use thresholds::{
    AlertLevel, BudgetThreshold, RemediationAction, default_thresholds, select_tier,
    sort_for_evaluation,
};
