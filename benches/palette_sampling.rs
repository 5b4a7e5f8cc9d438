//! Benchmarks for the per-pixel hot path
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ledvis_rs::palette::{HEAT, RAINBOW};
use ledvis_rs::topology::serpentine_index;

fn bench_palette_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("palette_sample");
    group.throughput(Throughput::Elements(256));

    group.bench_function("interpolated_full_range", |b| {
        b.iter(|| {
            for index in 0u16..=255 {
                black_box(RAINBOW.sample(black_box(index as u8), 255, true));
            }
        })
    });

    group.bench_function("snapped_full_range", |b| {
        b.iter(|| {
            for index in 0u16..=255 {
                black_box(HEAT.sample(black_box(index as u8), 255, false));
            }
        })
    });

    for brightness in [64u8, 128, 255] {
        group.bench_with_input(
            BenchmarkId::new("interpolated_at_brightness", brightness),
            &brightness,
            |b, &brightness| {
                b.iter(|| {
                    for index in 0u16..=255 {
                        black_box(RAINBOW.sample(black_box(index as u8), brightness, true));
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_full_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_frame");

    // 4 strips x 144 LEDs, the simulator's default layout
    for (strips, leds) in [(1usize, 144usize), (4, 144)] {
        let total = (strips * leds) as u64;
        group.throughput(Throughput::Elements(total));
        group.bench_with_input(
            BenchmarkId::new("gradient", format!("{strips}x{leds}")),
            &(strips, leds),
            |b, &(strips, leds)| {
                b.iter(|| {
                    for s in 0..strips {
                        for i in 0..leds {
                            let index = (i * 255 / leds) as u8;
                            black_box(RAINBOW.sample(index, 255, true));
                            black_box(s);
                        }
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_serpentine_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("serpentine_index");
    group.throughput(Throughput::Elements(16 * 16));

    group.bench_function("16x16_sweep", |b| {
        b.iter(|| {
            for x in 0..16 {
                for y in 0..16 {
                    black_box(serpentine_index(16, 16, black_box(x), black_box(y)));
                }
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_palette_sample,
    bench_full_frame,
    bench_serpentine_index
);
criterion_main!(benches);
