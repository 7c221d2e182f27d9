//! # memprobe
//!
//! Infer memory-hierarchy parameters from access timing alone.
//!
//! This crate measures access latency over purpose-built memory layouts and
//! locates the knees in the resulting curves, outputting:
//! - Cache line size in bytes
//! - L1/L2/L3 capacities in bytes
//! - Set associativity in ways
//! - Virtual page size in bytes
//! - TLB capacity in entries
//!
//! No privileged or vendor-specific interface is used. Every result is a
//! best-effort estimate: when a buffer cannot be allocated or no knee is
//! found, the documented default is reported instead of an error.
//!
//! ## Quick Start
//!
//! ```ignore
//! use memprobe::MemoryProber;
//!
//! let hierarchy = MemoryProber::new().probe_hierarchy();
//! println!("line size: {} B", hierarchy.line_size);
//! ```
//!
//! ## Custom clocks
//!
//! Measurements go through the [`TimeSource`] trait. The default is the
//! hardware counter where one is known:
//!
//! ```ignore
//! use memprobe::{ClockSpec, MemoryProber, ProbeConfig};
//!
//! let mut prober = MemoryProber::with_clock_spec(ClockSpec::Monotonic, ProbeConfig::quick());
//! let page = prober.page_size();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod pattern;
mod prober;
mod result;

// Functional modules
pub mod affinity;
pub mod detect;
pub mod measurement;
pub mod output;
pub mod preflight;
pub mod topology;

// Re-exports for public API
pub use affinity::{apply_core_hint, CoreClass};
pub use config::{
    AssociativitySweep, CacheSizeSweep, LineSizeSweep, Mode, PageSizeSweep, ProbeConfig, TlbSweep,
};
pub use curve::{CurvePoint, LatencyCurve};
pub use detect::Thresholds;
pub use error::{AffinityError, ProbeError, TopologyError};
pub use measurement::{ClockSpec, CycleCounter, LatencyProfiler, MonotonicClock, PlatformClock, TimeSource};
pub use prober::{trial_seed, MemoryProber};
pub use result::{CacheSizes, CoreRun, MemoryHierarchy, MemoryReport, Metadata, ProbeCurves, ProbeRun};
pub use topology::CacheDescriptor;

/// Convenience function: probe every parameter with the default configuration.
///
/// Takes tens of seconds with the full tables; see [`ProbeConfig::quick`]
/// for a faster, coarser run.
pub fn probe() -> MemoryHierarchy {
    MemoryProber::new().probe_hierarchy()
}
