//! Tick sources for latency measurement.
//!
//! The profiler is generic over [`TimeSource`], so probes never hardcode an
//! instruction set. Two platform implementations are provided:
//! - [`CycleCounter`] - `lfence; rdtsc` on x86_64, `isb; mrs cntvct_el0` on aarch64
//! - [`MonotonicClock`] - nanoseconds from `std::time::Instant`
//!
//! [`PlatformClock`] wraps both behind one enum and [`ClockSpec`] chooses
//! between them, deferring calibration until a prober is built.

use std::time::{Duration, Instant};

use super::fence;

/// A monotonically non-decreasing tick counter plus its ordering barrier.
///
/// Units are platform-defined. Wraparound is not handled: a single probe
/// runs for far less than a counter period.
pub trait TimeSource {
    /// Sample the counter.
    fn now(&mut self) -> u64;

    /// Order all prior memory accesses before the next sample.
    #[inline]
    fn barrier(&self) {
        fence::barrier();
    }

    /// Short name for reports.
    fn name(&self) -> &'static str;

    /// Ticks per nanosecond, or 1.0 when ticks are nanoseconds.
    fn ticks_per_ns(&self) -> f64 {
        1.0
    }

    /// Smallest observable tick difference in nanoseconds.
    fn resolution_ns(&self) -> f64 {
        1.0 / self.ticks_per_ns().max(f64::MIN_POSITIVE)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &mut T {
    #[inline]
    fn now(&mut self) -> u64 {
        (**self).now()
    }

    #[inline]
    fn barrier(&self) {
        (**self).barrier()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn ticks_per_ns(&self) -> f64 {
        (**self).ticks_per_ns()
    }

    fn resolution_ns(&self) -> f64 {
        (**self).resolution_ns()
    }
}

/// Read the raw hardware counter with instruction serialisation.
///
/// On targets without a known counter this falls back to nanoseconds since
/// the first call.
#[inline]
pub fn read_cycle_counter() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        let ticks: u64;
        unsafe {
            std::arch::asm!(
                "lfence",
                "rdtsc",
                "shl rdx, 32",
                "or rax, rdx",
                out("rax") ticks,
                out("rdx") _,
                options(nostack, nomem),
            );
        }
        ticks
    }

    #[cfg(target_arch = "aarch64")]
    {
        let ticks: u64;
        unsafe {
            std::arch::asm!(
                "isb",
                "mrs {}, cntvct_el0",
                out(reg) ticks,
                options(nostack, nomem),
            );
        }
        ticks
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        use std::sync::OnceLock;
        static START: OnceLock<Instant> = OnceLock::new();
        START.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }
}

/// Estimate counter ticks per nanosecond from short sleeps.
///
/// Returns the median ratio over `rounds` sleeps of one millisecond, or 1.0
/// if no round produced a usable ratio.
pub fn calibrate_ticks_per_ns(rounds: usize) -> f64 {
    let mut ratios = Vec::with_capacity(rounds);

    for _ in 0..rounds {
        let start_ticks = read_cycle_counter();
        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(1));
        let end_ticks = read_cycle_counter();
        let elapsed_ns = start.elapsed().as_nanos() as u64;

        if elapsed_ns == 0 {
            continue;
        }
        ratios.push(end_ticks.saturating_sub(start_ticks) as f64 / elapsed_ns as f64);
    }

    if ratios.is_empty() {
        return 1.0;
    }

    ratios.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = ratios.len() / 2;
    if ratios.len() % 2 == 0 {
        (ratios[mid - 1] + ratios[mid]) / 2.0
    } else {
        ratios[mid]
    }
}

/// Back-to-back reads sampled when estimating a counter's step.
const STEP_SAMPLES: usize = 1000;

/// Minimum non-zero difference between back-to-back reads of `read`.
fn min_step(mut read: impl FnMut() -> u64, samples: usize) -> Option<u64> {
    let mut min_diff = u64::MAX;
    for _ in 0..samples {
        let t1 = read();
        let t2 = read();
        let diff = t2.saturating_sub(t1);
        if diff > 0 && diff < min_diff {
            min_diff = diff;
        }
    }
    (min_diff != u64::MAX).then_some(min_diff)
}

/// Minimum non-zero difference between back-to-back counter reads, in ticks.
fn min_tick_step() -> Option<u64> {
    min_step(read_cycle_counter, STEP_SAMPLES)
}

/// Raw hardware cycle/virtual counter.
#[derive(Debug, Clone)]
pub struct CycleCounter {
    ticks_per_ns: f64,
    resolution_ns: f64,
}

impl CycleCounter {
    /// Calibration sleeps used by [`CycleCounter::new`].
    pub const CALIBRATION_ROUNDS: usize = 20;

    /// Create a counter and calibrate it against the wall clock.
    pub fn new() -> Self {
        Self::with_ticks_per_ns(calibrate_ticks_per_ns(Self::CALIBRATION_ROUNDS))
    }

    /// Create a counter with a known tick rate.
    pub fn with_ticks_per_ns(ticks_per_ns: f64) -> Self {
        let resolution_ns = if ticks_per_ns <= 0.0 {
            1.0
        } else if ticks_per_ns < 0.1 {
            // Virtual timers such as the 24 MHz Apple Silicon counter tick
            // slower than the core; one tick is the resolution.
            1.0 / ticks_per_ns
        } else {
            min_tick_step()
                .map(|step| step as f64 / ticks_per_ns)
                .unwrap_or(1.0 / ticks_per_ns)
        };
        Self {
            ticks_per_ns,
            resolution_ns,
        }
    }
}

impl Default for CycleCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for CycleCounter {
    #[inline]
    fn now(&mut self) -> u64 {
        read_cycle_counter()
    }

    fn name(&self) -> &'static str {
        #[cfg(target_arch = "x86_64")]
        {
            "rdtsc"
        }
        #[cfg(target_arch = "aarch64")]
        {
            "cntvct_el0"
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            "instant"
        }
    }

    fn ticks_per_ns(&self) -> f64 {
        self.ticks_per_ns
    }

    fn resolution_ns(&self) -> f64 {
        self.resolution_ns
    }
}

/// Nanosecond monotonic clock.
///
/// `Instant` reports nanoseconds but many platforms only advance it in
/// steps of tens of nanoseconds. The step is measured once at construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
    resolution_ns: f64,
}

impl MonotonicClock {
    /// Create a clock whose zero is the moment of construction.
    pub fn new() -> Self {
        let origin = Instant::now();
        let step = min_step(|| origin.elapsed().as_nanos() as u64, STEP_SAMPLES);
        Self {
            origin,
            resolution_ns: step.map_or(1.0, |step| step as f64),
        }
    }

    /// Create a clock with a known step, skipping the measurement.
    pub fn with_resolution_ns(resolution_ns: f64) -> Self {
        Self {
            origin: Instant::now(),
            resolution_ns,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    #[inline]
    fn now(&mut self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn name(&self) -> &'static str {
        "monotonic"
    }

    fn resolution_ns(&self) -> f64 {
        self.resolution_ns
    }
}

/// Either platform clock, chosen at runtime.
#[derive(Debug, Clone)]
pub enum PlatformClock {
    /// Hardware counter.
    Cycle(CycleCounter),
    /// `Instant`-based nanoseconds.
    Monotonic(MonotonicClock),
}

impl Default for PlatformClock {
    fn default() -> Self {
        ClockSpec::Auto.create()
    }
}

impl TimeSource for PlatformClock {
    #[inline]
    fn now(&mut self) -> u64 {
        match self {
            PlatformClock::Cycle(c) => c.now(),
            PlatformClock::Monotonic(c) => c.now(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PlatformClock::Cycle(c) => c.name(),
            PlatformClock::Monotonic(c) => c.name(),
        }
    }

    fn ticks_per_ns(&self) -> f64 {
        match self {
            PlatformClock::Cycle(c) => c.ticks_per_ns(),
            PlatformClock::Monotonic(c) => c.ticks_per_ns(),
        }
    }

    fn resolution_ns(&self) -> f64 {
        match self {
            PlatformClock::Cycle(c) => c.resolution_ns(),
            PlatformClock::Monotonic(c) => c.resolution_ns(),
        }
    }
}

/// Which platform clock to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClockSpec {
    /// Hardware counter where one is known, monotonic clock otherwise.
    #[default]
    Auto,
    /// Always the hardware counter (falls back to nanoseconds off x86_64/aarch64).
    CycleCounter,
    /// Always the monotonic clock.
    Monotonic,
}

impl ClockSpec {
    /// Build and calibrate the clock.
    pub fn create(&self) -> PlatformClock {
        match self {
            ClockSpec::CycleCounter => PlatformClock::Cycle(CycleCounter::new()),
            ClockSpec::Monotonic => PlatformClock::Monotonic(MonotonicClock::new()),
            ClockSpec::Auto => {
                if cfg!(any(target_arch = "x86_64", target_arch = "aarch64")) {
                    PlatformClock::Cycle(CycleCounter::new())
                } else {
                    PlatformClock::Monotonic(MonotonicClock::new())
                }
            }
        }
    }
}

impl std::fmt::Display for ClockSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockSpec::Auto => write!(f, "Auto"),
            ClockSpec::CycleCounter => write!(f, "CycleCounter"),
            ClockSpec::Monotonic => write!(f, "Monotonic"),
        }
    }
}
