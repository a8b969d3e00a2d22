//! Budget alerts and synchronous handler dispatch.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::thresholds::{AlertLevel, RemediationAction};

/// A single budget alert, created when a threshold tier fires outside its
/// cooldown window. Alerts are immutable once issued; handlers may retain
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub id: Uuid,
    pub level: AlertLevel,
    pub message: String,
    pub utilization: f64,
    pub tokens_used: usize,
    pub tokens_available: usize,
    pub recommended_actions: Vec<RemediationAction>,
    pub timestamp: DateTime<Utc>,
}

/// Callback notified for every issued alert.
///
/// Handlers run synchronously in registration order. A handler error is
/// logged and skipped; it never affects other handlers or the check result.
pub trait AlertHandler: Send {
    /// Handler name for log lines.
    fn name(&self) -> &str {
        "alert-handler"
    }

    fn on_alert(&self, alert: &BudgetAlert) -> Result<()>;
}

/// Prints alerts to the console, colored by severity.
pub struct ConsoleAlertHandler;

impl AlertHandler for ConsoleAlertHandler {
    fn name(&self) -> &str {
        "console"
    }

    fn on_alert(&self, alert: &BudgetAlert) -> Result<()> {
        let label = match alert.level {
            AlertLevel::Emergency => console::style("EMERGENCY").red().bold(),
            AlertLevel::Critical => console::style("CRITICAL").red(),
            AlertLevel::Warning => console::style("WARNING").yellow(),
            AlertLevel::Info => console::style("INFO").dim(),
        };
        println!(
            "  {} {} (actions: {})",
            label,
            alert.message,
            alert
                .recommended_actions
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }
}

/// Deliver an alert to every handler, isolating failures per handler.
pub fn dispatch(handlers: &[Box<dyn AlertHandler>], alert: &BudgetAlert) {
    for handler in handlers {
        if let Err(err) = handler.on_alert(alert) {
            tracing::warn!("Alert handler '{}' failed: {:#}", handler.name(), err);
        }
    }
}
