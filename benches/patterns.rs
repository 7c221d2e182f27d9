use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use memprobe::measurement::{LatencyProfiler, MonotonicClock};
use memprobe::pattern::{PageChase, PointerChase, StridedSweep, WORD_BYTES};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_construction");
    for elements in [1usize << 10, 1 << 16, 1 << 20] {
        group.bench_with_input(BenchmarkId::new("pointer_chase", elements), &elements, |b, &n| {
            b.iter(|| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(12345);
                let chase = PointerChase::new(n * WORD_BYTES, &mut rng, None).unwrap();
                black_box(chase.origin())
            });
        });
    }

    let mut chase = PageChase::new(4096, 4096, None).unwrap();
    group.bench_function("page_chase_relink_4096", |b| {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(54321);
        b.iter(|| {
            chase.link(4096, &mut rng).unwrap();
            black_box(chase.origin_page())
        });
    });
    group.finish();
}

fn bench_profiler(c: &mut Criterion) {
    let mut group = c.benchmark_group("profiler");
    group.sample_size(20);

    let mut profiler = LatencyProfiler::new(MonotonicClock::new());
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(12345);
    let mut chase = PointerChase::new(32 * 1024, &mut rng, None).unwrap();
    group.bench_function("l1_chase_10k", |b| {
        b.iter(|| black_box(profiler.measure(&mut chase, 1, 10_000)));
    });

    let mut sweep = StridedSweep::new(1 << 20, None).unwrap();
    sweep.set_stride(64);
    group.bench_function("strided_64_10k", |b| {
        b.iter(|| black_box(profiler.measure(&mut sweep, 1, 10_000)));
    });
    group.finish();
}

criterion_group!(benches, bench_construction, bench_profiler);
criterion_main!(benches);
