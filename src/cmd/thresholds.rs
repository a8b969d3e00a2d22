//! Threshold table display — `gauge thresholds`.

use anyhow::Result;

use gauge::config::GaugeToml;

pub fn cmd_thresholds(config: &GaugeToml) -> Result<()> {
    let mut monitor_config = config.to_monitor_config();
    // Present in escalation order: lowest tier first.
    monitor_config.thresholds.sort_by(|a, b| {
        a.utilization
            .partial_cmp(&b.utilization)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!();
    println!("{}", console::style("Budget Thresholds").bold().cyan());
    println!(
        "{:<12} {:<14} {:<10} {}",
        "Tier", "Utilization", "Cooldown", "Actions"
    );
    println!(
        "{:<12} {:<14} {:<10} {}",
        "------------", "--------------", "----------", "-------"
    );
    for tier in &monitor_config.thresholds {
        println!(
            "{:<12} {:<14} {:<10} {}",
            tier.level.to_string(),
            format!("≥ {:.0}%", tier.utilization * 100.0),
            format!("{}s", tier.cooldown.as_secs()),
            tier.actions
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!();
    Ok(())
}
