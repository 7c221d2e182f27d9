//! Measurement infrastructure.
//!
//! This module provides:
//! - Tick sources with platform-specific implementations
//! - The ordering barrier placed around every clock sample
//! - The latency profiler that turns a pattern into ticks per access
//!
//! # Clock Selection
//!
//! By default, timing uses the hardware counter:
//! - **x86_64**: `lfence; rdtsc` (core-frequency ticks)
//! - **aarch64**: `isb; mrs cntvct_el0` (virtual timer, frequency varies by SoC)
//!
//! Other targets fall back to a nanosecond monotonic clock. Knee detection
//! only looks at ratios, so the tick unit never has to be converted.

mod clock;
mod fence;
mod profiler;

pub use clock::{
    calibrate_ticks_per_ns, read_cycle_counter, ClockSpec, CycleCounter, MonotonicClock, PlatformClock,
    TimeSource,
};
pub use fence::barrier;
pub use profiler::{LatencyProfiler, MeasurementPlan};
