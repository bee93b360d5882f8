// Store metrics
//
// Lightweight counters for dispatch and effect activity

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Per-store dispatch metrics
///
/// Uses atomic operations so effect tasks can record outcomes without taking
/// the store lock. Logged on demand via [`log_summary`](Self::log_summary).
#[derive(Debug)]
pub struct Metrics {
    /// Actions that passed middleware (reducers and effects)
    pub actions_dispatched: AtomicU64,

    /// Reducer applications
    pub reducers_applied: AtomicU64,

    /// Effect tasks spawned
    pub effects_started: AtomicU64,

    /// Effects that resolved with `Ok`
    pub effects_succeeded: AtomicU64,

    /// Effects that resolved with `Err` or panicked
    pub effects_failed: AtomicU64,

    /// Total time spent in effect bodies in milliseconds
    pub total_effect_time_ms: AtomicU64,

    /// Store creation time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            actions_dispatched: AtomicU64::new(0),
            reducers_applied: AtomicU64::new(0),
            effects_started: AtomicU64::new(0),
            effects_succeeded: AtomicU64::new(0),
            effects_failed: AtomicU64::new(0),
            total_effect_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_action(&self) {
        self.actions_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reducer(&self) {
        self.reducers_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_effect_started(&self) {
        self.effects_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome and duration of a settled effect
    pub fn record_effect_settled(&self, succeeded: bool, duration: Duration) {
        if succeeded {
            self.effects_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.effects_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_effect_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Effects started but not yet settled
    pub fn effects_in_flight(&self) -> u64 {
        let started = self.effects_started.load(Ordering::Relaxed);
        let settled = self.effects_succeeded.load(Ordering::Relaxed)
            + self.effects_failed.load(Ordering::Relaxed);
        started.saturating_sub(settled)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average effect duration in milliseconds
    pub fn avg_effect_time_ms(&self) -> f64 {
        let total = self.total_effect_time_ms.load(Ordering::Relaxed);
        let count = self.effects_succeeded.load(Ordering::Relaxed)
            + self.effects_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Store Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Actions: {} dispatched, {} reducer applications",
            self.actions_dispatched.load(Ordering::Relaxed),
            self.reducers_applied.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Effects: {} started, {} succeeded, {} failed, {} in flight (avg: {:.2}ms)",
            self.effects_started.load(Ordering::Relaxed),
            self.effects_succeeded.load(Ordering::Relaxed),
            self.effects_failed.load(Ordering::Relaxed),
            self.effects_in_flight(),
            self.avg_effect_time_ms()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
