//! Knee detection on latency curves.
//!
//! This module provides:
//! - One breakpoint rule per hardware parameter ([`knee`])
//! - Mode selection across repeated trials ([`aggregate`])
//! - The overridable thresholds every rule reads ([`Thresholds`])

pub mod aggregate;
pub mod knee;

pub use aggregate::mode;
pub use knee::{
    associativity_knee, detect_associativity, detect_cache_sizes, detect_line_size, detect_page_size,
    detect_tlb_size, line_size_knee, page_size_knee, tlb_size_knee,
};

use serde::{Deserialize, Serialize};

use crate::constants;

/// Ratio thresholds and level boundaries used by the knee rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Line-size hump rise (default 1.3).
    pub line_rise: f64,
    /// L1 and L2 boundary rise (default 1.3).
    pub cache_rise: f64,
    /// L3 boundary rise (default 1.5).
    pub l3_rise: f64,
    /// Largest working set attributed to L1 (default 192 KiB).
    pub l1_max_bytes: usize,
    /// Largest working set attributed to L2 (default 16 MiB).
    pub l2_max_bytes: usize,
    /// Working sets above this may mark L3 (default 4 MiB).
    pub l3_min_bytes: usize,
    /// Minimum thrashing-onset rise (default 1.3).
    pub associativity_rise: f64,
    /// Page-boundary drop, compared strictly (default 0.6).
    pub page_drop: f64,
    /// TLB exhaustion rise (default 1.25).
    pub tlb_rise: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            line_rise: constants::LINE_RISE_RATIO,
            cache_rise: constants::CACHE_RISE_RATIO,
            l3_rise: constants::L3_RISE_RATIO,
            l1_max_bytes: constants::L1_MAX_BYTES,
            l2_max_bytes: constants::L2_MAX_BYTES,
            l3_min_bytes: constants::L3_MIN_BYTES,
            associativity_rise: constants::ASSOCIATIVITY_RISE_RATIO,
            page_drop: constants::PAGE_DROP_RATIO,
            tlb_rise: constants::TLB_RISE_RATIO,
        }
    }
}
