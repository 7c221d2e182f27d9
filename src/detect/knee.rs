//! Breakpoint rules, one per hardware parameter.
//!
//! Each `*_knee` function returns `None` when its rule never fires. The
//! matching `detect_*` function substitutes the documented default, so a
//! missing knee never reaches the caller as an error.

use log::debug;

use super::Thresholds;
use crate::constants::{
    DEFAULT_ASSOCIATIVITY, DEFAULT_LINE_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_TLB_ENTRIES, LINE_SCAN_START,
    PAGE_SCAN_START,
};
use crate::curve::LatencyCurve;
use crate::result::CacheSizes;

/// Stride at the peak of the first rise-then-flatten hump.
///
/// Expects a stride sweep already scaled by stride. Point `s` is the peak
/// when `ratio(s) > line_rise` and `ratio(s + 1) < line_rise`. The scan
/// starts at the third point and needs a successor point.
pub fn line_size_knee(curve: &LatencyCurve, thresholds: &Thresholds) -> Option<usize> {
    let end = curve.len().saturating_sub(1);
    for s in LINE_SCAN_START.max(1)..end {
        let (Some(rise), Some(next)) = (curve.ratio(s), curve.ratio(s + 1)) else {
            continue;
        };
        if rise > thresholds.line_rise && next < thresholds.line_rise {
            debug!("line-size hump at index {} (rise {:.3}, next {:.3})", s, rise, next);
            return curve.parameter(s);
        }
    }
    None
}

/// [`line_size_knee`] or [`DEFAULT_LINE_SIZE`].
pub fn detect_line_size(curve: &LatencyCurve, thresholds: &Thresholds) -> usize {
    line_size_knee(curve, thresholds).unwrap_or(DEFAULT_LINE_SIZE)
}

/// L1/L2/L3 capacities from a working-set sweep.
///
/// Every transition is checked against the levels in order and latches at
/// most one of them; a latched level never changes. The reported size is
/// the working set before the jump.
pub fn detect_cache_sizes(curve: &LatencyCurve, thresholds: &Thresholds) -> CacheSizes {
    let mut sizes = CacheSizes::default();

    for step in curve.steps() {
        let before = step.before;
        let ratio = step.ratio;

        if sizes.l1.is_none() && before <= thresholds.l1_max_bytes && ratio > thresholds.cache_rise {
            sizes.l1 = Some(before);
        } else if sizes.l2.is_none()
            && before > thresholds.l1_max_bytes
            && before <= thresholds.l2_max_bytes
            && ratio > thresholds.cache_rise
        {
            sizes.l2 = Some(before);
        } else if sizes.l3.is_none() && before > thresholds.l3_min_bytes && ratio > thresholds.l3_rise {
            sizes.l3 = Some(before);
        }
    }

    debug!("cache levels from {} points: {:?}", curve.len(), sizes);
    sizes
}

/// Way count preceding the largest rise above `associativity_rise`.
///
/// Unlike the cache-size rule this takes the global maximum, not the first
/// qualifying jump. Equal maxima keep the earlier candidate.
pub fn associativity_knee(curve: &LatencyCurve, thresholds: &Thresholds) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    for step in curve.steps() {
        if step.ratio > thresholds.associativity_rise && best.map_or(true, |(ratio, _)| step.ratio > ratio) {
            best = Some((step.ratio, step.before));
        }
    }
    best.map(|(_, ways)| ways)
}

/// [`associativity_knee`] or [`DEFAULT_ASSOCIATIVITY`].
pub fn detect_associativity(curve: &LatencyCurve, thresholds: &Thresholds) -> usize {
    associativity_knee(curve, thresholds).unwrap_or(DEFAULT_ASSOCIATIVITY)
}

/// Stride before the first per-access time drop below `page_drop`.
///
/// Expects unscaled per-access times. The comparison is strict and the scan
/// starts at the third point.
pub fn page_size_knee(curve: &LatencyCurve, thresholds: &Thresholds) -> Option<usize> {
    (PAGE_SCAN_START.max(1)..curve.len())
        .find(|&s| curve.ratio(s).is_some_and(|ratio| ratio < thresholds.page_drop))
        .and_then(|s| curve.parameter(s - 1))
}

/// [`page_size_knee`] or [`DEFAULT_PAGE_SIZE`].
pub fn detect_page_size(curve: &LatencyCurve, thresholds: &Thresholds) -> usize {
    page_size_knee(curve, thresholds).unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Page count before the first rise above `tlb_rise`.
pub fn tlb_size_knee(curve: &LatencyCurve, thresholds: &Thresholds) -> Option<usize> {
    curve
        .steps()
        .find(|step| step.ratio > thresholds.tlb_rise)
        .map(|step| step.before)
}

/// [`tlb_size_knee`] or [`DEFAULT_TLB_ENTRIES`].
pub fn detect_tlb_size(curve: &LatencyCurve, thresholds: &Thresholds) -> usize {
    tlb_size_knee(curve, thresholds).unwrap_or(DEFAULT_TLB_ENTRIES)
}
