//! Clock resolution check.
//!
//! Every probe averages many accesses per sample, so a coarse clock only
//! costs precision. A clock that never advances makes every curve flat and
//! every probe report its default.
//!
//! On ARM (aarch64), the virtual timer runs at ~24 MHz (~41ns resolution),
//! not at CPU frequency.

use std::hint::black_box;

use serde::{Deserialize, Serialize};

use crate::measurement::TimeSource;

/// Resolution above which the clock is reported as coarse.
pub const COARSE_RESOLUTION_NS: f64 = 10.0;

/// Spin iterations used to check that the clock advances.
const PROGRESS_SPIN: u64 = 1_000_000;

/// Warning from the clock check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionWarning {
    /// One tick is longer than [`COARSE_RESOLUTION_NS`].
    CoarseClock {
        /// Estimated resolution in nanoseconds.
        resolution_ns: f64,
        /// Threshold exceeded.
        threshold_ns: f64,
    },

    /// The clock did not advance across a busy loop.
    ///
    /// This is a critical warning - every probe will fall back to its default.
    ClockStalled {
        /// Clock name.
        clock: String,
    },
}

impl ResolutionWarning {
    /// Check if this warning indicates a critical issue.
    pub fn is_critical(&self) -> bool {
        matches!(self, ResolutionWarning::ClockStalled { .. })
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            ResolutionWarning::CoarseClock {
                resolution_ns,
                threshold_ns,
            } => {
                format!(
                    "Clock resolution (~{:.0}ns) is coarser than {:.0}ns. \
                     Short sweeps may quantize; consider more iterations per point.",
                    resolution_ns, threshold_ns
                )
            }
            ResolutionWarning::ClockStalled { clock } => {
                format!(
                    "CRITICAL: clock '{}' did not advance. All latency curves will be flat \
                     and every parameter will be reported as its default.",
                    clock
                )
            }
        }
    }
}

/// Check the clock's resolution and that it advances.
pub fn resolution_check<C: TimeSource + ?Sized>(clock: &mut C) -> Option<ResolutionWarning> {
    let start = clock.now();
    let mut acc = 0u64;
    for i in 0..PROGRESS_SPIN {
        acc = black_box(acc.wrapping_add(i));
    }
    black_box(acc);
    let end = clock.now();

    if end <= start {
        return Some(ResolutionWarning::ClockStalled {
            clock: clock.name().to_string(),
        });
    }

    let resolution_ns = clock.resolution_ns();
    if resolution_ns > COARSE_RESOLUTION_NS {
        return Some(ResolutionWarning::CoarseClock {
            resolution_ns,
            threshold_ns: COARSE_RESOLUTION_NS,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::MonotonicClock;

    struct FixedClock {
        step: u64,
        now: u64,
        resolution_ns: f64,
    }

    impl TimeSource for FixedClock {
        fn now(&mut self) -> u64 {
            self.now += self.step;
            self.now
        }

        fn name(&self) -> &'static str {
            "fixed"
        }

        fn resolution_ns(&self) -> f64 {
            self.resolution_ns
        }
    }

    #[test]
    fn test_fine_clock() {
        let mut clock = FixedClock {
            step: 5,
            now: 0,
            resolution_ns: 1.0,
        };
        assert!(resolution_check(&mut clock).is_none());
    }

    #[test]
    fn test_coarse_clock() {
        let mut clock = FixedClock {
            step: 1,
            now: 0,
            resolution_ns: 41.7,
        };
        let warning = resolution_check(&mut clock).unwrap();
        assert!(!warning.is_critical());
        assert!(warning.description().contains("42ns"));
    }

    #[test]
    fn test_coarse_monotonic_clock() {
        let mut clock = MonotonicClock::with_resolution_ns(32.0);
        match resolution_check(&mut clock) {
            Some(ResolutionWarning::CoarseClock { resolution_ns, .. }) => assert_eq!(resolution_ns, 32.0),
            other => panic!("expected coarse clock, got {:?}", other),
        }
        assert!(resolution_check(&mut MonotonicClock::with_resolution_ns(1.0)).is_none());
    }

    #[test]
    fn test_stalled_clock() {
        let mut clock = FixedClock {
            step: 0,
            now: 7,
            resolution_ns: 1.0,
        };
        let warning = resolution_check(&mut clock).unwrap();
        assert!(warning.is_critical());
        assert!(warning.description().contains("fixed"));
    }
}
