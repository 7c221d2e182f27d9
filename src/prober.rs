//! Probe orchestration.
//!
//! [`MemoryProber`] drives each probe family through the same pipeline:
//! build a pattern, measure it at every sweep point, hand the curve to the
//! matching knee rule. Every per-parameter method is fail-soft and returns
//! the documented default when the buffer cannot be allocated or no knee
//! is found. The `*_curve` methods expose the underlying `Result`.

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::ProbeConfig;
use crate::constants::{
    DEFAULT_ASSOCIATIVITY, DEFAULT_LINE_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_TLB_ENTRIES,
};
use crate::curve::LatencyCurve;
use crate::detect::{
    associativity_knee, detect_cache_sizes, line_size_knee, mode, page_size_knee, tlb_size_knee,
};
use crate::error::ProbeError;
use crate::measurement::{ClockSpec, LatencyProfiler, MeasurementPlan, PlatformClock, TimeSource};
use crate::pattern::{PageChase, PointerChase, StridedSweep, Workload};
use crate::result::{CacheSizes, MemoryHierarchy, ProbeCurves, ProbeRun};

/// Derive the seed of one trial from a base seed (SplitMix64).
///
/// Distinct trials get decorrelated streams while the whole trial set stays
/// reproducible for a fixed base seed.
pub fn trial_seed(base_seed: u64, trial: u64) -> u64 {
    let mut z = base_seed.wrapping_add(trial.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Timing-based memory hierarchy prober.
///
/// # Example
///
/// ```ignore
/// use memprobe::MemoryProber;
///
/// let mut prober = MemoryProber::quick().seed(7);
/// let line = prober.line_size();
/// let caches = prober.cache_sizes();
/// println!("line {} B, L1 {:?}", line, caches.l1);
/// ```
///
/// Any [`TimeSource`] can drive the measurements:
///
/// ```ignore
/// use memprobe::{MemoryProber, MonotonicClock, ProbeConfig};
///
/// let prober = MemoryProber::with_clock(MonotonicClock::new(), ProbeConfig::quick());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryProber<C = PlatformClock> {
    profiler: LatencyProfiler<C>,
    config: ProbeConfig,
}

impl Default for MemoryProber<PlatformClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProber<PlatformClock> {
    /// Create with the default configuration and the platform clock.
    ///
    /// The clock is calibrated here, which sleeps for a few milliseconds.
    pub fn new() -> Self {
        Self::with_clock(PlatformClock::default(), ProbeConfig::default())
    }

    /// Create with [`ProbeConfig::quick`].
    pub fn quick() -> Self {
        Self::with_clock(PlatformClock::default(), ProbeConfig::quick())
    }

    /// Create with a specific platform clock.
    pub fn with_clock_spec(spec: ClockSpec, config: ProbeConfig) -> Self {
        Self::with_clock(spec.create(), config)
    }
}

impl<C: TimeSource> MemoryProber<C> {
    /// Create around an arbitrary clock.
    pub fn with_clock(clock: C, config: ProbeConfig) -> Self {
        Self {
            profiler: LatencyProfiler::new(clock),
            config,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ProbeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `seed` for every pattern family.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    /// Cap every probe buffer at `bytes`.
    ///
    /// Larger requests fail as allocation failures, so the affected probe
    /// reports its default.
    pub fn memory_limit(mut self, bytes: usize) -> Self {
        self.config.memory_limit_bytes = Some(bytes);
        self
    }

    /// Set the number of TLB trials.
    pub fn tlb_trials(mut self, trials: usize) -> Self {
        self.config.tlb.trials = trials;
        self
    }

    /// Current configuration.
    pub fn settings(&self) -> &ProbeConfig {
        &self.config
    }

    /// The clock driving every measurement.
    pub fn clock(&self) -> &C {
        self.profiler.clock()
    }

    /// Consume the prober and return its clock.
    pub fn into_clock(self) -> C {
        self.profiler.into_clock()
    }

    // =========================================================================
    // Line size
    // =========================================================================

    /// Stride sweep scaled by stride.
    pub fn line_size_curve(&mut self) -> Result<LatencyCurve, ProbeError> {
        let sweep = &self.config.line_size;
        let mut pattern = StridedSweep::new(sweep.buffer_bytes, self.config.memory_limit_bytes)?;
        let curve = strided_curve(&mut self.profiler, &mut pattern, &sweep.strides, sweep.iterations);
        non_empty(curve.scaled_by_parameter(), "line size")
    }

    /// Cache line size in bytes.
    pub fn line_size(&mut self) -> usize {
        let curve = self.line_size_curve();
        self.line_size_from(&curve)
    }

    fn line_size_from(&self, curve: &Result<LatencyCurve, ProbeError>) -> usize {
        knee_or_default(curve, "line size", DEFAULT_LINE_SIZE, |c| {
            line_size_knee(c, &self.config.thresholds)
        })
    }

    // =========================================================================
    // Cache sizes
    // =========================================================================

    /// Working-set sweep over randomised pointer chases.
    ///
    /// An allocation failure past the first working set ends the sweep;
    /// the measured prefix is returned.
    pub fn cache_size_curve(&mut self) -> Result<LatencyCurve, ProbeError> {
        let sweep = &self.config.cache_sizes;
        let limit = self.config.memory_limit_bytes;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(sweep.seed);
        let mut curve = LatencyCurve::new();

        for &working_set in &sweep.working_sets {
            let built = PointerChase::new(working_set, &mut rng, limit);
            let Some(mut chase) = keep_prefix(built, &curve, "cache-size", working_set)? else {
                break;
            };
            let n = chase.len();
            let plan = MeasurementPlan::new(sweep.iterations, n.saturating_mul(sweep.accesses_per_element))
                .with_warmup(n);
            let latency = self.profiler.run(&mut chase, &plan);
            debug!("working set {} B: {:.3} ticks/access", working_set, latency);
            curve.push(working_set, latency);
        }

        non_empty(curve, "cache size")
    }

    /// L1/L2/L3 capacities in bytes.
    pub fn cache_sizes(&mut self) -> CacheSizes {
        let curve = self.cache_size_curve();
        self.cache_sizes_from(&curve)
    }

    fn cache_sizes_from(&self, curve: &Result<LatencyCurve, ProbeError>) -> CacheSizes {
        match curve {
            Ok(curve) => {
                let sizes = detect_cache_sizes(curve, &self.config.thresholds);
                info!("cache sizes: {:?}", sizes);
                if sizes.levels_found() == 0 {
                    warn!("no cache-size transitions found; reporting no levels");
                }
                sizes
            }
            Err(e) => {
                warn!("cache-size probe failed: {}; reporting no levels", e);
                CacheSizes::default()
            }
        }
    }

    // =========================================================================
    // Associativity
    // =========================================================================

    /// Per-access latency for each candidate way count.
    ///
    /// Candidates share one buffer with addresses `set_stride` apart, so all
    /// of them map to the same cache set.
    pub fn associativity_curve(&mut self) -> Result<LatencyCurve, ProbeError> {
        let sweep = &self.config.associativity;
        let capacity = sweep.candidates.iter().copied().max().unwrap_or(0);
        let mut chase = PageChase::new(capacity, sweep.set_stride, self.config.memory_limit_bytes)?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(sweep.seed);
        let mut curve = LatencyCurve::new();

        for &ways in &sweep.candidates {
            if keep_prefix(chase.link(ways, &mut rng), &curve, "associativity", ways)?.is_none() {
                break;
            }
            let plan = MeasurementPlan::new(sweep.iterations, sweep.rounds.saturating_mul(ways)).with_warmup(ways);
            let latency = self.profiler.run(&mut chase, &plan);
            debug!("{} ways: {:.3} ticks/access", ways, latency);
            curve.push(ways, latency);
        }

        non_empty(curve, "associativity")
    }

    /// Set associativity in ways.
    pub fn associativity(&mut self) -> usize {
        let curve = self.associativity_curve();
        self.associativity_from(&curve)
    }

    fn associativity_from(&self, curve: &Result<LatencyCurve, ProbeError>) -> usize {
        knee_or_default(curve, "associativity", DEFAULT_ASSOCIATIVITY, |c| {
            associativity_knee(c, &self.config.thresholds)
        })
    }

    // =========================================================================
    // Page size
    // =========================================================================

    /// Stride sweep, per access.
    pub fn page_size_curve(&mut self) -> Result<LatencyCurve, ProbeError> {
        let sweep = &self.config.page_size;
        let mut pattern = StridedSweep::new(sweep.buffer_bytes, self.config.memory_limit_bytes)?;
        let curve = strided_curve(&mut self.profiler, &mut pattern, &sweep.strides, sweep.iterations);
        non_empty(curve, "page size")
    }

    /// Virtual page size in bytes.
    pub fn page_size(&mut self) -> usize {
        let curve = self.page_size_curve();
        self.page_size_from(&curve)
    }

    fn page_size_from(&self, curve: &Result<LatencyCurve, ProbeError>) -> usize {
        knee_or_default(curve, "page size", DEFAULT_PAGE_SIZE, |c| {
            page_size_knee(c, &self.config.thresholds)
        })
    }

    // =========================================================================
    // TLB
    // =========================================================================

    /// Page-count sweep with one chase slot per page of `page_size` bytes.
    ///
    /// A relink failure past the first page count ends the sweep; the
    /// measured prefix is returned.
    pub fn tlb_curve(&mut self, page_size: usize, seed: u64) -> Result<LatencyCurve, ProbeError> {
        let sweep = &self.config.tlb;
        let mut chase = PageChase::new(sweep.max_pages(), page_size, self.config.memory_limit_bytes)?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut curve = LatencyCurve::new();

        for &pages in &sweep.page_counts {
            if keep_prefix(chase.link(pages, &mut rng), &curve, "TLB", pages)?.is_none() {
                break;
            }
            let pages = chase.pages();
            let plan = MeasurementPlan::new(sweep.iterations, pages.saturating_mul(sweep.accesses_per_page))
                .with_warmup(pages.saturating_mul(sweep.warmup_per_page));
            let latency = self.profiler.run(&mut chase, &plan);
            debug!("{} pages: {:.3} ticks/access", pages, latency);
            curve.push(pages, latency);
        }

        non_empty(curve, "TLB")
    }

    /// TLB capacity from a single trial.
    pub fn tlb_size_once(&mut self, page_size: usize, trial: u64) -> usize {
        let seed = trial_seed(self.config.tlb.seed, trial);
        let curve = self.tlb_curve(page_size, seed);
        self.tlb_size_from(&curve)
    }

    fn tlb_size_from(&self, curve: &Result<LatencyCurve, ProbeError>) -> usize {
        knee_or_default(curve, "TLB", DEFAULT_TLB_ENTRIES, |c| {
            tlb_size_knee(c, &self.config.thresholds)
        })
    }

    /// TLB capacity in entries: the mode over the configured trials.
    pub fn tlb_size(&mut self, page_size: usize) -> usize {
        self.tlb_trials_with_curves(page_size).0
    }

    fn tlb_trials_with_curves(&mut self, page_size: usize) -> (usize, Vec<LatencyCurve>) {
        let trials = self.config.tlb.trials;
        let mut results = Vec::with_capacity(trials);
        let mut curves = Vec::with_capacity(trials);

        for trial in 0..trials {
            let seed = trial_seed(self.config.tlb.seed, trial as u64);
            let curve = self.tlb_curve(page_size, seed);
            results.push(self.tlb_size_from(&curve));
            if let Ok(curve) = curve {
                curves.push(curve);
            }
        }
        debug!("TLB trial results: {:?}", results);

        let entries = mode(&results).unwrap_or_else(|| {
            warn!("no TLB trials ran; using default {}", DEFAULT_TLB_ENTRIES);
            DEFAULT_TLB_ENTRIES
        });
        info!("TLB entries: {} (mode of {} trials)", entries, results.len());
        (entries, curves)
    }

    // =========================================================================
    // Whole hierarchy
    // =========================================================================

    /// Run every probe and keep the curves.
    ///
    /// The TLB probe uses the page size detected earlier in the same run.
    pub fn run(&mut self) -> ProbeRun {
        let line_curve = self.line_size_curve();
        let line_size = self.line_size_from(&line_curve);

        let cache_curve = self.cache_size_curve();
        let caches = self.cache_sizes_from(&cache_curve);

        let associativity_curve = self.associativity_curve();
        let associativity = self.associativity_from(&associativity_curve);

        let page_curve = self.page_size_curve();
        let page_size = self.page_size_from(&page_curve);

        let (tlb_entries, tlb_curves) = self.tlb_trials_with_curves(page_size);

        ProbeRun {
            hierarchy: MemoryHierarchy {
                line_size,
                caches,
                associativity,
                page_size,
                tlb_entries,
            },
            curves: ProbeCurves {
                line_size: line_curve.ok(),
                cache_sizes: cache_curve.ok(),
                associativity: associativity_curve.ok(),
                page_size: page_curve.ok(),
                tlb: tlb_curves,
            },
        }
    }

    /// Run every probe and keep only the parameters.
    pub fn probe_hierarchy(&mut self) -> MemoryHierarchy {
        self.run().hierarchy
    }
}

/// Measure one point per stride, one traversal of warm-up each.
fn strided_curve<C: TimeSource>(
    profiler: &mut LatencyProfiler<C>,
    pattern: &mut StridedSweep,
    strides: &[usize],
    iterations: usize,
) -> LatencyCurve {
    let mut curve = LatencyCurve::new();
    for &stride in strides {
        pattern.set_stride(stride);
        let accesses = pattern.traversal_len();
        let plan = MeasurementPlan::new(iterations, accesses).with_warmup(accesses);
        let latency = profiler.run(pattern, &plan);
        debug!("stride {} B: {:.3} ticks/access", stride, latency);
        curve.push(stride, latency);
    }
    curve
}

/// Pass a sweep point's setup through, or end the sweep on failure.
///
/// Failure before any point was measured is an error. Later failures are
/// `Ok(None)` and the caller stops, keeping the points it already has.
fn keep_prefix<T>(
    setup: Result<T, ProbeError>,
    curve: &LatencyCurve,
    sweep: &str,
    parameter: usize,
) -> Result<Option<T>, ProbeError> {
    match setup {
        Ok(value) => Ok(Some(value)),
        Err(e) if curve.is_empty() => Err(e),
        Err(e) => {
            warn!("{} sweep stopped at {}: {}", sweep, parameter, e);
            Ok(None)
        }
    }
}

fn non_empty(curve: LatencyCurve, probe: &'static str) -> Result<LatencyCurve, ProbeError> {
    if curve.is_empty() {
        Err(ProbeError::EmptySweep { probe })
    } else {
        Ok(curve)
    }
}

fn knee_or_default(
    curve: &Result<LatencyCurve, ProbeError>,
    probe: &str,
    default: usize,
    knee: impl FnOnce(&LatencyCurve) -> Option<usize>,
) -> usize {
    match curve {
        Ok(curve) => match knee(curve) {
            Some(value) => {
                info!("{}: {}", probe, value);
                value
            }
            None => {
                warn!("no {} knee found; using default {}", probe, default);
                default
            }
        },
        Err(e) => {
            warn!("{} probe failed: {}; using default {}", probe, e, default);
            default
        }
    }
}
