//! Knee detection on synthetic curves.

use memprobe::constants::{DEFAULT_ASSOCIATIVITY, DEFAULT_LINE_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_TLB_ENTRIES};
use memprobe::detect::{
    detect_associativity, detect_cache_sizes, detect_line_size, detect_page_size, detect_tlb_size, mode,
    page_size_knee,
};
use memprobe::{CacheSizes, LatencyCurve, Thresholds};

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

const PAGE_STRIDES: [usize; 6] = [512, 1024, 2048, 4096, 8192, 16384];

#[test]
fn test_cache_jump_reports_size_before() {
    let sizes = [4 * KIB, 8 * KIB, 16 * KIB, 32 * KIB, 64 * KIB, 128 * KIB];
    let curve = LatencyCurve::from_pairs(&sizes, &[1.0, 1.0, 1.0, 1.0, 2.0, 2.0]);
    let found = detect_cache_sizes(&curve, &Thresholds::default());
    assert_eq!(found.l1, Some(sizes[3]));
    assert_eq!(found.l2, None);
    assert_eq!(found.l3, None);
}

#[test]
fn test_cache_flat_curve_reports_nothing() {
    let sizes = [4 * KIB, 64 * KIB, MIB, 8 * MIB, 32 * MIB];
    let curve = LatencyCurve::from_pairs(&sizes, &[3.0; 5]);
    assert_eq!(detect_cache_sizes(&curve, &Thresholds::default()), CacheSizes::default());
}

#[test]
fn test_cache_three_levels() {
    let sizes = [16 * KIB, 32 * KIB, 64 * KIB, MIB, 2 * MIB, 6 * MIB, 8 * MIB, 24 * MIB, 32 * MIB];
    let lat = [1.0, 1.0, 3.0, 3.0, 9.0, 9.0, 9.0, 9.0, 40.0];
    let found = detect_cache_sizes(&LatencyCurve::from_pairs(&sizes, &lat), &Thresholds::default());
    assert_eq!(
        found,
        CacheSizes {
            l1: Some(32 * KIB),
            l2: Some(MIB),
            l3: Some(24 * MIB),
        }
    );
    assert_eq!(found.levels_found(), 3);
}

#[test]
fn test_cache_later_jump_does_not_replace_latched_level() {
    // Two L1-range jumps: the first one wins.
    let sizes = [4 * KIB, 8 * KIB, 16 * KIB, 32 * KIB];
    let lat = [1.0, 1.4, 1.4, 5.0];
    let found = detect_cache_sizes(&LatencyCurve::from_pairs(&sizes, &lat), &Thresholds::default());
    assert_eq!(found.l1, Some(4 * KIB));
}

#[test]
fn test_associativity_prefers_larger_jump() {
    let curve = LatencyCurve::from_pairs(&[2, 4, 6, 8, 10], &[1.0, 1.4, 1.4, 2.24, 2.24]);
    assert_eq!(detect_associativity(&curve, &Thresholds::default()), 6);
}

#[test]
fn test_associativity_default_without_jump() {
    let curve = LatencyCurve::from_pairs(&[2, 4, 8, 16], &[1.0, 1.1, 1.2, 1.3]);
    assert_eq!(detect_associativity(&curve, &Thresholds::default()), DEFAULT_ASSOCIATIVITY);
}

#[test]
fn test_line_size_on_scaled_curve() {
    let raw = LatencyCurve::from_pairs(
        &[8, 16, 32, 64, 128, 256, 512, 1024],
        &[1.0, 0.5, 0.25, 0.25, 0.125, 0.0625, 0.03125, 0.015625],
    );
    // Scaled: 8, 8, 8, 16, 16, 16, 16, 16.
    let scaled = raw.scaled_by_parameter();
    assert_eq!(detect_line_size(&scaled, &Thresholds::default()), 64);
}

#[test]
fn test_line_size_default_on_flat_curve() {
    let curve = LatencyCurve::from_pairs(&[8, 16, 32, 64, 128], &[2.0; 5]);
    assert_eq!(detect_line_size(&curve, &Thresholds::default()), DEFAULT_LINE_SIZE);
}

#[test]
fn test_page_size_threshold_ratio_is_not_a_drop() {
    let curve = LatencyCurve::from_pairs(&PAGE_STRIDES, &[10.0, 10.0, 10.0, 6.0, 6.0, 6.0]);
    assert_eq!(page_size_knee(&curve, &Thresholds::default()), None);
    assert_eq!(detect_page_size(&curve, &Thresholds::default()), 4096);
}

#[test]
fn test_page_size_real_drop() {
    let curve = LatencyCurve::from_pairs(&PAGE_STRIDES, &[10.0, 10.0, 10.0, 10.0, 5.0, 5.0]);
    assert_eq!(page_size_knee(&curve, &Thresholds::default()), Some(4096));
}

#[test]
fn test_page_size_threshold_override() {
    let thresholds = Thresholds {
        page_drop: 0.61,
        ..Thresholds::default()
    };
    let curve = LatencyCurve::from_pairs(&PAGE_STRIDES, &[10.0, 10.0, 10.0, 6.0, 6.0, 6.0]);
    assert_eq!(detect_page_size(&curve, &thresholds), 2048);
    assert_ne!(DEFAULT_PAGE_SIZE, 2048);
}

#[test]
fn test_tlb_first_jump_and_default() {
    let pages = [8, 16, 32, 64, 128, 256];
    let jump = LatencyCurve::from_pairs(&pages, &[1.0, 1.0, 1.1, 1.5, 1.5, 3.0]);
    assert_eq!(detect_tlb_size(&jump, &Thresholds::default()), 32);

    let flat = LatencyCurve::from_pairs(&pages, &[1.0; 6]);
    assert_eq!(detect_tlb_size(&flat, &Thresholds::default()), DEFAULT_TLB_ENTRIES);
}

#[test]
fn test_mode_selection() {
    assert_eq!(mode(&[64, 64, 128, 64, 256]), Some(64));
    assert_eq!(mode(&[128, 64, 64, 128]), Some(128));
    assert_eq!(mode::<usize>(&[]), None);
}
