//! Per-access latency measurement.
//!
//! Each timed pass rewinds the pattern, fences, samples the clock, runs the
//! dependent accesses, fences and samples again. Nothing is fenced inside
//! the loop itself. The estimate is total elapsed ticks divided by the
//! total number of accesses.

use std::hint::black_box;

use serde::{Deserialize, Serialize};

use super::clock::TimeSource;
use crate::pattern::Workload;

/// How many passes and accesses one sweep point costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementPlan {
    /// Timed passes.
    pub iterations: usize,
    /// Dependent accesses per timed pass.
    pub accesses_per_iteration: usize,
    /// Untimed accesses before the first pass (0 disables warm-up).
    pub warmup_accesses: usize,
}

impl MeasurementPlan {
    /// Plan without warm-up.
    pub fn new(iterations: usize, accesses_per_iteration: usize) -> Self {
        Self {
            iterations,
            accesses_per_iteration,
            warmup_accesses: 0,
        }
    }

    /// Add an untimed warm-up of `accesses`.
    pub fn with_warmup(mut self, accesses: usize) -> Self {
        self.warmup_accesses = accesses;
        self
    }

    /// Total timed accesses.
    pub fn total_accesses(&self) -> usize {
        self.iterations.saturating_mul(self.accesses_per_iteration)
    }
}

/// Runs access patterns against a [`TimeSource`].
#[derive(Debug, Clone)]
pub struct LatencyProfiler<C> {
    clock: C,
}

impl<C: TimeSource> LatencyProfiler<C> {
    /// Create a profiler around `clock`.
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// The underlying clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Consume the profiler and return its clock.
    pub fn into_clock(self) -> C {
        self.clock
    }

    /// Average ticks per access over `iterations` timed passes.
    ///
    /// Returns 0.0 when no access would be timed.
    pub fn measure<W: Workload + ?Sized>(
        &mut self,
        pattern: &mut W,
        iterations: usize,
        accesses_per_iteration: usize,
    ) -> f64 {
        let total_accesses = iterations.saturating_mul(accesses_per_iteration);
        if total_accesses == 0 {
            return 0.0;
        }

        let mut total_ticks: u64 = 0;
        let mut sink = 0usize;

        for _ in 0..iterations {
            pattern.reset();

            self.clock.barrier();
            let start = self.clock.now();
            self.clock.barrier();

            sink ^= pattern.access(accesses_per_iteration);

            self.clock.barrier();
            let end = self.clock.now();
            total_ticks = total_ticks.saturating_add(end.saturating_sub(start));
        }

        black_box(sink);
        total_ticks as f64 / total_accesses as f64
    }

    /// Warm up as planned, then [`measure`](Self::measure).
    pub fn run<W: Workload + ?Sized>(&mut self, pattern: &mut W, plan: &MeasurementPlan) -> f64 {
        if plan.warmup_accesses > 0 {
            pattern.reset();
            black_box(pattern.access(plan.warmup_accesses));
        }
        self.measure(pattern, plan.iterations, plan.accesses_per_iteration)
    }
}
