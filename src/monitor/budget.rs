//! The budget monitor control loop.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use super::actions::{execute_all, ActionOutcome};
use super::advisor::{self, AllocationAdvice};
use super::alert::{dispatch, AlertHandler, BudgetAlert};
use super::stats::{self, MonitoringStats, UtilizationSample};
use super::thresholds::{
    default_thresholds, select_tier, sort_for_evaluation, AlertLevel, BudgetThreshold,
    RemediationAction,
};
use crate::compress::{Compressor, HeuristicCompressor};
use crate::context::{ContextCategory, ContextStore};

/// Default interval between background budget checks.
pub const DEFAULT_MONITORING_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum alerts retained in history; oldest evicted first.
pub const ALERT_HISTORY_CAP: usize = 100;

/// Maximum utilization samples retained.
pub const SAMPLE_HISTORY_CAP: usize = 500;

/// Bound on how long `stop_monitoring` waits for the background thread.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Granularity of the background loop's interruptible sleep.
const POLL_TICK: Duration = Duration::from_millis(50);

/// Runtime configuration for a [`BudgetMonitor`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between background checks.
    pub interval: Duration,
    /// Whether a fired tier's remediation actions run automatically.
    pub enable_auto_actions: bool,
    /// Escalation table; need not be pre-sorted.
    pub thresholds: Vec<BudgetThreshold>,
    /// Target share of total tokens per category, for the advisor.
    pub targets: BTreeMap<ContextCategory, f64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_MONITORING_INTERVAL,
            enable_auto_actions: true,
            thresholds: default_thresholds(),
            targets: advisor::default_targets(),
        }
    }
}

/// Mutable monitor state, guarded by one lock.
struct MonitorState {
    samples: VecDeque<UtilizationSample>,
    alert_history: VecDeque<BudgetAlert>,
    last_alert_at: HashMap<AlertLevel, Instant>,
    alert_counts: BTreeMap<AlertLevel, usize>,
    last_action_outcomes: Vec<ActionOutcome>,
}

impl MonitorState {
    fn new() -> Self {
        Self {
            samples: VecDeque::new(),
            alert_history: VecDeque::new(),
            last_alert_at: HashMap::new(),
            alert_counts: BTreeMap::new(),
            last_action_outcomes: Vec::new(),
        }
    }

    fn record_sample(&mut self, sample: UtilizationSample) {
        self.samples.push_back(sample);
        while self.samples.len() > SAMPLE_HISTORY_CAP {
            self.samples.pop_front();
        }
    }

    fn record_alert(&mut self, alert: BudgetAlert) {
        *self.alert_counts.entry(alert.level).or_insert(0) += 1;
        self.last_alert_at.insert(alert.level, Instant::now());
        self.alert_history.push_back(alert);
        while self.alert_history.len() > ALERT_HISTORY_CAP {
            self.alert_history.pop_front();
        }
    }

    fn within_cooldown(&self, tier: &BudgetThreshold) -> bool {
        self.last_alert_at
            .get(&tier.level)
            .is_some_and(|last| last.elapsed() < tier.cooldown)
    }
}

/// Everything the background thread shares with the owning handle.
struct MonitorCore {
    store: Arc<Mutex<ContextStore>>,
    compressor: Box<dyn Compressor>,
    config: MonitorConfig,
    /// Lowest utilization threshold whose tier blocks intake, if any.
    intake_block_floor: Option<f64>,
    state: Mutex<MonitorState>,
    handlers: Mutex<Vec<Box<dyn AlertHandler>>>,
    /// Serializes whole checks so concurrent callers cannot double-run
    /// a tier's actions.
    check_guard: Mutex<()>,
    stop_flag: AtomicBool,
}

/// Watches a shared [`ContextStore`] against a tiered threshold table and
/// runs each tier's remediation actions when it fires.
///
/// One monitor is constructed per store; it holds the store only through a
/// shared reference and never owns items. Checks can run synchronously from
/// any thread and from the optional background polling loop; all internal
/// state is lock-protected.
pub struct BudgetMonitor {
    core: Arc<MonitorCore>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BudgetMonitor {
    /// Create a monitor over a shared store with the default compressor.
    pub fn new(store: Arc<Mutex<ContextStore>>, config: MonitorConfig) -> Self {
        Self::with_compressor(store, config, Box::new(HeuristicCompressor::default()))
    }

    /// Create a monitor with a specific compression backend.
    pub fn with_compressor(
        store: Arc<Mutex<ContextStore>>,
        mut config: MonitorConfig,
        compressor: Box<dyn Compressor>,
    ) -> Self {
        sort_for_evaluation(&mut config.thresholds);
        let intake_block_floor = config
            .thresholds
            .iter()
            .filter(|t| t.actions.contains(&RemediationAction::BlockNewContent))
            .map(|t| t.utilization)
            .fold(None, |acc: Option<f64>, u| {
                Some(acc.map_or(u, |a| a.min(u)))
            });

        Self {
            core: Arc::new(MonitorCore {
                store,
                compressor,
                config,
                intake_block_floor,
                state: Mutex::new(MonitorState::new()),
                handlers: Mutex::new(Vec::new()),
                check_guard: Mutex::new(()),
                stop_flag: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Register a callback invoked for every issued alert. Handlers run in
    /// registration order; duplicates are allowed.
    pub fn add_alert_handler(&self, handler: Box<dyn AlertHandler>) {
        lock_ignore_poison(&self.core.handlers).push(handler);
    }

    /// Run one budget check: sample utilization, pick the active tier, and
    /// (outside the tier's cooldown) issue an alert and run its actions.
    ///
    /// Never panics or returns an error: a store that cannot be read makes
    /// the check inconclusive and yields `(Info, None)`.
    pub fn check_budget_status(&self) -> (AlertLevel, Option<BudgetAlert>) {
        self.core.check_budget_status()
    }

    /// Start the background polling loop. Calling while already running is
    /// a no-op.
    pub fn start_monitoring(&self) {
        let mut worker = lock_ignore_poison(&self.worker);
        if worker.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        self.core.stop_flag.store(false, Ordering::Relaxed);
        let core = Arc::clone(&self.core);
        match std::thread::Builder::new()
            .name("budget-monitor".to_string())
            .spawn(move || core.run_loop())
        {
            Ok(handle) => *worker = Some(handle),
            Err(err) => {
                tracing::error!("Failed to spawn budget monitor thread: {}", err);
            }
        }
    }

    /// Stop the background polling loop, waiting a bounded time for the
    /// thread to exit. Safe to call repeatedly or without a prior start.
    pub fn stop_monitoring(&self) {
        self.core.stop_flag.store(true, Ordering::Relaxed);

        let handle = lock_ignore_poison(&self.worker).take();
        let Some(handle) = handle else {
            return;
        };

        let deadline = Instant::now() + STOP_JOIN_TIMEOUT;
        while !handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(POLL_TICK);
        }
        if handle.is_finished() {
            if handle.join().is_err() {
                tracing::warn!("Budget monitor thread panicked before join");
            }
        } else {
            tracing::warn!(
                "Budget monitor thread did not stop within {:?}; detaching",
                STOP_JOIN_TIMEOUT
            );
        }
    }

    /// Whether the background loop is currently running.
    pub fn is_monitoring(&self) -> bool {
        lock_ignore_poison(&self.worker)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Advisory reallocation of the token budget across categories.
    pub fn optimization_recommendations(&self) -> AllocationAdvice {
        let summary = match self.core.store.lock() {
            Ok(store) => store.get_summary(),
            Err(_) => {
                tracing::error!("Context store lock poisoned; advising on empty summary");
                return advisor::advise(
                    &crate::context::StoreSummary {
                        total_tokens: 0,
                        budget_utilization: 0.0,
                        total_items: 0,
                        tokens_by_category: BTreeMap::new(),
                    },
                    &self.core.config.targets,
                );
            }
        };
        advisor::advise(&summary, &self.core.config.targets)
    }

    /// Aggregate statistics over the recorded sample and alert history.
    pub fn monitoring_statistics(&self) -> MonitoringStats {
        let state = lock_ignore_poison(&self.core.state);
        stats::compute(
            &state.samples,
            &state.alert_counts,
            state.alert_history.back().cloned(),
        )
    }

    /// Issued alerts, oldest first, bounded by [`ALERT_HISTORY_CAP`].
    pub fn alert_history(&self) -> Vec<BudgetAlert> {
        lock_ignore_poison(&self.core.state)
            .alert_history
            .iter()
            .cloned()
            .collect()
    }

    /// Per-action results from the most recent check that ran actions.
    pub fn last_action_outcomes(&self) -> Vec<ActionOutcome> {
        lock_ignore_poison(&self.core.state)
            .last_action_outcomes
            .clone()
    }

    /// The shared store this monitor watches.
    pub fn store(&self) -> Arc<Mutex<ContextStore>> {
        Arc::clone(&self.core.store)
    }
}

impl Drop for BudgetMonitor {
    fn drop(&mut self) {
        self.core.stop_flag.store(true, Ordering::Relaxed);
    }
}

impl MonitorCore {
    fn check_budget_status(&self) -> (AlertLevel, Option<BudgetAlert>) {
        let _check = lock_ignore_poison(&self.check_guard);

        // A poisoned store lock makes the check inconclusive, not fatal.
        let (summary, max_tokens) = match self.store.lock() {
            Ok(store) => (store.get_summary(), store.max_tokens()),
            Err(_) => {
                tracing::error!("Context store lock poisoned; skipping budget check");
                return (AlertLevel::Info, None);
            }
        };

        let utilization = summary.budget_utilization;
        lock_ignore_poison(&self.state).record_sample(UtilizationSample {
            timestamp: Utc::now(),
            utilization,
            total_tokens: summary.total_tokens,
            total_items: summary.total_items,
        });

        self.maybe_unblock_intake(utilization);

        let Some(tier) = select_tier(&self.config.thresholds, utilization) else {
            return (AlertLevel::Info, None);
        };

        // Within the cooldown window the level is still reported, but no
        // alert is issued and no actions run.
        if lock_ignore_poison(&self.state).within_cooldown(tier) {
            return (tier.level, None);
        }

        let alert = BudgetAlert {
            id: Uuid::new_v4(),
            level: tier.level,
            message: format!(
                "Context budget at {:.1}% ({} / {} tokens)",
                utilization * 100.0,
                summary.total_tokens,
                max_tokens
            ),
            utilization,
            tokens_used: summary.total_tokens,
            tokens_available: max_tokens.saturating_sub(summary.total_tokens),
            recommended_actions: tier.actions.clone(),
            timestamp: Utc::now(),
        };
        lock_ignore_poison(&self.state).record_alert(alert.clone());

        if self.config.enable_auto_actions {
            let outcomes =
                execute_all(&tier.actions, &alert, &self.store, self.compressor.as_ref());
            lock_ignore_poison(&self.state).last_action_outcomes = outcomes;
        }

        // Handlers run last, after all state mutation is done.
        let handlers = lock_ignore_poison(&self.handlers);
        dispatch(&handlers, &alert);

        (tier.level, Some(alert))
    }

    /// Clear the intake block once utilization falls back below the lowest
    /// tier that sets it.
    fn maybe_unblock_intake(&self, utilization: f64) {
        let Some(floor) = self.intake_block_floor else {
            return;
        };
        if utilization >= floor {
            return;
        }
        if let Ok(mut store) = self.store.lock()
            && store.intake_blocked()
        {
            store.set_intake_blocked(false);
            tracing::info!(
                "Context intake unblocked at {:.1}% utilization",
                utilization * 100.0
            );
        }
    }

    fn run_loop(&self) {
        tracing::debug!("Budget monitor loop started");
        while !self.stop_flag.load(Ordering::Relaxed) {
            let _ = self.check_budget_status();

            // Sleep in short ticks so stop_monitoring joins promptly.
            let mut remaining = self.config.interval;
            while !self.stop_flag.load(Ordering::Relaxed) && remaining > Duration::ZERO {
                let tick = remaining.min(POLL_TICK);
                std::thread::sleep(tick);
                remaining = remaining.saturating_sub(tick);
            }
        }
        tracing::debug!("Budget monitor loop stopped");
    }
}

/// Monitor-internal state is plain data; a poisoned lock is recoverable.
fn lock_ignore_poison<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
