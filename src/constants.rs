//! Default sentinels, sweep tables and detection thresholds.
//!
//! The thresholds encode empirical tuning rather than algorithmic necessity.
//! Every one of them is copied into [`crate::detect::Thresholds`] and
//! [`crate::ProbeConfig`] so callers can override them.

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

/// Reported cache line size when no knee is found (bytes).
pub const DEFAULT_LINE_SIZE: usize = 64;

/// Reported associativity when no knee is found (ways).
pub const DEFAULT_ASSOCIATIVITY: usize = 8;

/// Reported page size when no drop is found (bytes).
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Reported TLB capacity when no knee is found (entries).
pub const DEFAULT_TLB_ENTRIES: usize = 64;

/// Consecutive-ratio rise that marks a line-size hump.
pub const LINE_RISE_RATIO: f64 = 1.3;

/// Consecutive-ratio rise that marks the L1 and L2 boundaries.
pub const CACHE_RISE_RATIO: f64 = 1.3;

/// Consecutive-ratio rise that marks the L3 boundary.
pub const L3_RISE_RATIO: f64 = 1.5;

/// Largest working set (inclusive) still attributed to L1.
pub const L1_MAX_BYTES: usize = 192 * KIB;

/// Largest working set (inclusive) still attributed to L2.
pub const L2_MAX_BYTES: usize = 16 * MIB;

/// Working sets must exceed this before a transition is attributed to L3.
pub const L3_MIN_BYTES: usize = 4 * MIB;

/// Minimum ratio rise considered for thrashing onset.
pub const ASSOCIATIVITY_RISE_RATIO: f64 = 1.3;

/// A per-access time ratio strictly below this marks the page boundary.
pub const PAGE_DROP_RATIO: f64 = 0.6;

/// Consecutive-ratio rise that marks TLB exhaustion.
pub const TLB_RISE_RATIO: f64 = 1.25;

/// First curve index the line-size rule inspects.
pub const LINE_SCAN_START: usize = 2;

/// First curve index the page-size rule inspects.
pub const PAGE_SCAN_START: usize = 2;

/// Strides swept by the line-size probe (bytes).
pub const LINE_STRIDES: [usize; 8] = [8, 16, 32, 64, 128, 256, 512, 1024];

/// Backing buffer for the line-size probe (bytes).
pub const LINE_BUFFER_BYTES: usize = 32 * MIB;

/// Working-set sizes swept by the cache-size probe (bytes).
pub const CACHE_WORKING_SETS: [usize; 24] = [
    4 * KIB,
    8 * KIB,
    16 * KIB,
    32 * KIB,
    48 * KIB,
    64 * KIB,
    96 * KIB,
    128 * KIB,
    192 * KIB,
    256 * KIB,
    384 * KIB,
    512 * KIB,
    768 * KIB,
    MIB,
    1536 * KIB,
    2 * MIB,
    3 * MIB,
    4 * MIB,
    6 * MIB,
    8 * MIB,
    12 * MIB,
    16 * MIB,
    24 * MIB,
    32 * MIB,
];

/// Seed for the cache-size pointer chases.
pub const CACHE_SEED: u64 = 12345;

/// Same-set candidate counts swept by the associativity probe.
pub const ASSOCIATIVITY_CANDIDATES: [usize; 11] = [2, 4, 6, 8, 10, 12, 14, 16, 20, 24, 32];

/// Distance between same-set addresses in the associativity probe (bytes).
pub const ASSOCIATIVITY_SET_STRIDE: usize = 4096;

/// Seed for the associativity chases.
pub const ASSOCIATIVITY_SEED: u64 = 24680;

/// Strides swept by the page-size probe (bytes).
pub const PAGE_STRIDES: [usize; 6] = [512, 1024, 2048, 4096, 8192, 16384];

/// Backing buffer for the page-size probe (bytes).
pub const PAGE_BUFFER_BYTES: usize = 128 * MIB;

/// Page counts swept by the TLB probe.
pub const TLB_PAGE_COUNTS: [usize; 10] = [8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096];

/// Seed for the TLB chases.
pub const TLB_SEED: u64 = 54321;

/// Independent TLB trials aggregated by mode.
pub const TLB_TRIALS: usize = 10;
