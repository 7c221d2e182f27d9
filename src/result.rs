//! Detection results and report types.

use serde::{Deserialize, Serialize};

use crate::affinity::CoreClass;
use crate::config::ProbeConfig;
use crate::curve::LatencyCurve;
use crate::preflight::PreflightWarning;
use crate::topology::CacheDescriptor;

/// Inferred data-cache capacities in bytes.
///
/// A level is `None` when no qualifying transition was seen, which is the
/// documented default for every level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSizes {
    /// First-level data cache.
    pub l1: Option<usize>,
    /// Second-level cache.
    pub l2: Option<usize>,
    /// Third-level cache.
    pub l3: Option<usize>,
}

impl CacheSizes {
    /// Number of levels that were found.
    pub fn levels_found(&self) -> usize {
        [self.l1, self.l2, self.l3].iter().filter(|l| l.is_some()).count()
    }
}

/// The five inferred parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryHierarchy {
    /// Cache line size in bytes.
    pub line_size: usize,
    /// Per-level cache capacities.
    pub caches: CacheSizes,
    /// L1 set associativity in ways.
    pub associativity: usize,
    /// Virtual page size in bytes.
    pub page_size: usize,
    /// TLB capacity in entries.
    pub tlb_entries: usize,
}

/// Raw curves behind a [`MemoryHierarchy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeCurves {
    /// Stride sweep, scaled by stride.
    pub line_size: Option<LatencyCurve>,
    /// Working-set sweep.
    pub cache_sizes: Option<LatencyCurve>,
    /// Same-set candidate sweep.
    pub associativity: Option<LatencyCurve>,
    /// Stride sweep, per access.
    pub page_size: Option<LatencyCurve>,
    /// One page-count sweep per TLB trial.
    pub tlb: Vec<LatencyCurve>,
}

/// A full probe run: the parameters plus the curves they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRun {
    /// Detected parameters.
    pub hierarchy: MemoryHierarchy,
    /// Curves each detector consumed. `None` where the sweep failed.
    pub curves: ProbeCurves,
}

/// Line-size and cache-size results for one core class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreRun {
    /// Core class requested before probing.
    pub core_class: CoreClass,
    /// Whether the platform accepted the hint.
    pub hint_applied: bool,
    /// Cache line size in bytes.
    pub line_size: usize,
    /// Per-level cache capacities.
    pub caches: CacheSizes,
}

/// Metadata for debugging and reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Clock used for every measurement.
    pub clock: String,
    /// Calibrated clock ticks per nanosecond.
    pub ticks_per_ns: f64,
    /// Estimated clock resolution in nanoseconds.
    pub clock_resolution_ns: f64,
    /// Wall-clock duration of the run in seconds.
    pub runtime_secs: f64,
    /// Configuration snapshot, seeds included.
    pub config: ProbeConfig,
}

/// Everything the reporting layer prints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryReport {
    /// Inferred parameters.
    pub hierarchy: MemoryHierarchy,
    /// Curves, when requested.
    pub curves: Option<ProbeCurves>,
    /// Per-core-class runs, when requested.
    pub core_runs: Vec<CoreRun>,
    /// Operating-system cache descriptors, when available and requested.
    pub authoritative: Vec<CacheDescriptor>,
    /// Preflight warnings collected before probing.
    pub warnings: Vec<PreflightWarning>,
    /// Run metadata.
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_found() {
        assert_eq!(CacheSizes::default().levels_found(), 0);
        let sizes = CacheSizes {
            l1: Some(32 * 1024),
            l2: None,
            l3: Some(8 * 1024 * 1024),
        };
        assert_eq!(sizes.levels_found(), 2);
    }
}
