//! Workload replay — `gauge simulate`.
//!
//! Feeds a recorded workload of content additions through a monitored store,
//! running a budget check after each event, then prints the monitoring
//! statistics and allocation advice for the final state.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::Deserialize;

use gauge::config::GaugeToml;
use gauge::context::ContextCategory;
use gauge::monitor::{
    AllocationAdvice, BudgetMonitor, ConsoleAlertHandler, MonitoringStats,
};

/// One content addition in a workload file.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadEvent {
    pub content: String,
    #[serde(default = "default_category")]
    pub category: ContextCategory,
    #[serde(default = "default_importance")]
    pub importance: f64,
    #[serde(default = "default_source")]
    pub source: String,
    /// Add the same content this many times.
    #[serde(default = "default_repeat")]
    pub repeat: usize,
}

fn default_category() -> ContextCategory {
    ContextCategory::AgentOutput
}

fn default_importance() -> f64 {
    0.5
}

fn default_source() -> String {
    "workload".to_string()
}

fn default_repeat() -> usize {
    1
}

pub fn cmd_simulate(config: &GaugeToml, workload_path: &Path, verbose: bool) -> Result<()> {
    let raw = std::fs::read_to_string(workload_path)
        .with_context(|| format!("Failed to read workload {}", workload_path.display()))?;
    let events: Vec<WorkloadEvent> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse workload {}", workload_path.display()))?;

    println!();
    println!("{}", console::style("Gauge Budget Simulation").bold().cyan());
    println!(
        "Budget: {} tokens, {} events",
        config.store.max_tokens,
        events.iter().map(|e| e.repeat).sum::<usize>()
    );
    println!();

    let store = Arc::new(Mutex::new(config.build_store()));
    let monitor = BudgetMonitor::new(Arc::clone(&store), config.to_monitor_config());
    monitor.add_alert_handler(Box::new(ConsoleAlertHandler));

    let mut step = 0usize;
    let mut rejected = 0usize;
    for event in &events {
        for _ in 0..event.repeat.max(1) {
            step += 1;
            let added = store
                .lock()
                .map_err(|_| anyhow::anyhow!("Context store lock poisoned"))?
                .add_content(
                    event.content.clone(),
                    event.category,
                    event.importance,
                    event.source.clone(),
                );
            if let Err(err) = added {
                rejected += 1;
                println!("  {} {}", console::style("REJECTED").magenta(), err);
            }

            let (level, _alert) = monitor.check_budget_status();
            if verbose {
                let guard = store
                    .lock()
                    .map_err(|_| anyhow::anyhow!("Context store lock poisoned"))?;
                println!(
                    "  step {:>3}: {:<9} {:>6.1}% ({} tokens)",
                    step,
                    level.to_string(),
                    guard.utilization() * 100.0,
                    guard.current_token_count()
                );
            }
        }
    }

    if rejected > 0 {
        println!();
        println!(
            "{} {} addition(s) rejected while intake was blocked",
            console::style("Note:").yellow(),
            rejected
        );
    }

    display_statistics(&monitor.monitoring_statistics());
    display_advice(&monitor.optimization_recommendations());
    Ok(())
}

fn display_statistics(stats: &MonitoringStats) {
    println!();
    println!("{}", console::style("Monitoring Statistics").bold().cyan());
    println!(
        "{:<24} {:<12} {:<12} {:<12}",
        "", "Current", "Average", "Peak"
    );
    println!(
        "{:<24} {:<12.1} {:<12.1} {:<12.1}",
        "Utilization (%)",
        stats.current_utilization * 100.0,
        stats.average_utilization * 100.0,
        stats.peak_utilization * 100.0
    );
    println!(
        "{:<24} {:<12} {:<12.0} {:<12}",
        "Tokens", stats.current_tokens, stats.average_tokens, stats.peak_tokens
    );
    println!();
    println!("Measurements: {}", stats.measurements);

    if stats.alerts_by_level.is_empty() {
        println!("Alerts: none");
    } else {
        let counts: Vec<String> = stats
            .alerts_by_level
            .iter()
            .map(|(level, count)| format!("{} {}", count, level))
            .collect();
        println!("Alerts: {}", counts.join(", "));
    }

    if let Some(last) = &stats.last_alert {
        println!("Last alert: [{}] {}", last.level, last.message);
    }
}

fn display_advice(advice: &AllocationAdvice) {
    println!();
    println!("{}", console::style("Allocation Advice").bold().cyan());
    println!(
        "{:<16} {:<12} {:<14} {:<10}",
        "Category", "Current", "Recommended", "Change"
    );
    println!(
        "{:<16} {:<12} {:<14} {:<10}",
        "----------------", "------------", "--------------", "----------"
    );
    for (category, current) in &advice.current_allocation {
        let recommended = advice.recommended_allocation[category];
        let change = advice.expected_change[category];
        println!(
            "{:<16} {:<12} {:<14} {:<+10}",
            category.to_string(),
            current,
            recommended,
            change
        );
    }
    println!();
    println!("{}", advice.rationale);
}
