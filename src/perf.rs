//! Highlight pass instrumentation
//!
//! Records how long passes take and warns when one runs over budget.
//! Purely observational: nothing here can change or abort a pass.

use std::time::Duration;

use tracing::{debug, warn};

/// Target duration for a pass over `BUDGET_LINES` lines
pub const TARGET_BUDGET: Duration = Duration::from_millis(100);

/// Document size the target budget is defined for
pub const BUDGET_LINES: usize = 10_000;

/// Snapshot returned by `Engine::performance_stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerformanceStats {
    pub last_highlight_time: Duration,
    pub total_highlights: u64,
    pub average_time: Duration,
    pub cache_size: usize,
    pub max_cache_size: usize,
}

/// Running pass statistics
#[derive(Debug, Clone, Default)]
pub struct PerfTracker {
    last: Duration,
    total_time: Duration,
    passes: u64,
}

impl PerfTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget for a document of `line_count` lines
    ///
    /// 100ms per started block of 10,000 lines.
    pub fn budget_for(line_count: usize) -> Duration {
        let blocks = line_count.max(1).div_ceil(BUDGET_LINES);
        TARGET_BUDGET * u32::try_from(blocks).unwrap_or(u32::MAX)
    }

    /// Record a finished pass
    ///
    /// Returns whether the pass ran over budget.
    pub fn record(
        &mut self,
        elapsed: Duration,
        line_count: usize,
        cached: bool,
        log_every_pass: bool,
    ) -> bool {
        self.last = elapsed;
        self.total_time += elapsed;
        self.passes += 1;

        if log_every_pass {
            debug!(
                target: "mdlive::perf",
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                lines = line_count,
                cached,
                pass = self.passes,
                "highlight pass"
            );
        }

        let budget = Self::budget_for(line_count);
        let over = elapsed > budget;
        if over {
            warn!(
                target: "mdlive::perf",
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                lines = line_count,
                "highlight pass exceeded its budget"
            );
        }
        over
    }

    pub fn last(&self) -> Duration {
        self.last
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn average(&self) -> Duration {
        if self.passes == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.total_time.as_secs_f64() / self.passes as f64)
    }

    pub fn snapshot(&self, cache_size: usize, max_cache_size: usize) -> PerformanceStats {
        PerformanceStats {
            last_highlight_time: self.last,
            total_highlights: self.passes,
            average_time: self.average(),
            cache_size,
            max_cache_size,
        }
    }
}
