//! Access-pattern construction through the public API.

use memprobe::pattern::{visit_order, PageChase, PointerChase, StridedSweep, Workload, WORD_BYTES};
use memprobe::ProbeError;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn rng(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Follow `links` N times from `start`; every index must be seen exactly
/// once and the walk must end back at `start`.
fn assert_single_cycle(links: &[usize], start: usize) {
    let n = links.len();
    let mut seen = vec![false; n];
    let mut idx = start;
    for step in 0..n {
        assert!(!seen[idx], "index {} revisited at step {}", idx, step);
        seen[idx] = true;
        idx = links[idx];
    }
    assert_eq!(idx, start, "walk did not return to its start");
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn test_pointer_chase_single_cycle_from_every_start() {
    for (seed, n) in [(1u64, 2usize), (2, 7), (3, 64), (4, 1000)] {
        let chase = PointerChase::new(n * WORD_BYTES, &mut rng(seed), None).unwrap();
        for start in 0..n {
            assert_single_cycle(chase.links(), start);
        }
    }
}

#[test]
fn test_page_chase_single_cycle_after_relinking() {
    let mut chase = PageChase::new(128, 4096, None).unwrap();
    let mut r = rng(54321);
    for pages in [8, 16, 32, 64, 128] {
        chase.link(pages, &mut r).unwrap();
        let links = chase.page_links();
        for start in [0, pages / 2, pages - 1] {
            assert_single_cycle(&links, start);
        }
    }
}

#[test]
fn test_same_seed_same_order() {
    let a = PointerChase::new(4096 * WORD_BYTES, &mut rng(12345), None).unwrap();
    let b = PointerChase::new(4096 * WORD_BYTES, &mut rng(12345), None).unwrap();
    assert_eq!(a, b);

    let c = PointerChase::new(4096 * WORD_BYTES, &mut rng(12346), None).unwrap();
    assert_ne!(a.links(), c.links());
}

#[test]
fn test_same_seed_same_page_links() {
    let mut a = PageChase::new(64, 4096, None).unwrap();
    let mut b = PageChase::new(64, 4096, None).unwrap();
    a.link(64, &mut rng(9)).unwrap();
    b.link(64, &mut rng(9)).unwrap();
    assert_eq!(a.page_links(), b.page_links());
    assert_eq!(a.origin_page(), b.origin_page());
}

#[test]
fn test_visit_order_deterministic() {
    assert_eq!(
        visit_order(500, &mut rng(77), None).unwrap(),
        visit_order(500, &mut rng(77), None).unwrap()
    );
}

#[test]
fn test_chase_access_returns_to_origin() {
    let mut chase = PointerChase::new(333 * WORD_BYTES, &mut rng(5), None).unwrap();
    chase.reset();
    assert_eq!(chase.access(chase.len()), chase.origin());
}

#[test]
fn test_strided_traversal_len() {
    let mut sweep = StridedSweep::new(64 * 1024, None).unwrap();
    sweep.set_stride(64);
    assert_eq!(sweep.traversal_len(), 1024);
    sweep.set_stride(4096);
    assert_eq!(sweep.traversal_len(), 16);
    assert_eq!(sweep.len_bytes(), 64 * 1024);
}

#[test]
fn test_budget_exceeded_is_allocation_failure() {
    let err = PageChase::new(4096, 4096, Some(1024 * 1024)).unwrap_err();
    assert!(matches!(err, ProbeError::AllocationFailed { bytes } if bytes == 4096 * 4096));
}
