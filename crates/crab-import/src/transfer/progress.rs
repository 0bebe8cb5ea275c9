//! Throughput reporting.

use std::time::{Duration, Instant};

use tracing::info;

/// Minimum time between periodic reports.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Counts saved items and logs the rate at most once per second.
///
/// Reports are driven by [`ProgressMonitor::record_one`]; nothing runs in the
/// background.
#[derive(Debug)]
pub struct ProgressMonitor<C: Clock = SystemClock> {
    clock: C,
    total: u64,
    last_printed: u64,
    last_print: Instant,
    reports: u64,
}

impl ProgressMonitor<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ProgressMonitor<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ProgressMonitor<C> {
    pub fn with_clock(clock: C) -> Self {
        let last_print = clock.now();
        Self {
            clock,
            total: 0,
            last_printed: 0,
            last_print,
            reports: 0,
        }
    }

    /// Count one item. Returns the running total.
    pub fn record_one(&mut self) -> u64 {
        self.total += 1;
        let now = self.clock.now();
        if now.duration_since(self.last_print) >= REPORT_INTERVAL {
            self.report(now);
        }
        self.total
    }

    /// Report the current total regardless of the interval.
    pub fn flush_print(&mut self) {
        let now = self.clock.now();
        self.report(now);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of report lines emitted so far.
    pub fn reports(&self) -> u64 {
        self.reports
    }

    fn report(&mut self, now: Instant) {
        info!(
            "Saved {} items ({} items/s)",
            self.total,
            self.total - self.last_printed
        );
        self.last_printed = self.total;
        self.last_print = now;
        self.reports += 1;
    }
}
