use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tracker_core::types::Detection;
use tracker_core::{Tracker, TrackerConfig};

/// `n` position detections on a grid, all advanced by 1 m/s along x.
fn make_batch(n: usize, t: f64) -> Vec<Detection> {
    (0..n)
        .map(|i| {
            let x = (i % 50) as f64 * 20.0 + t;
            let y = (i / 50) as f64 * 20.0;
            Detection::position(x, y, t)
        })
        .collect()
}

fn bench_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker");

    for n in [50, 500, 1000] {
        group.bench_function(format!("{n}_targets"), |b| {
            b.iter(|| {
                let mut tracker = Tracker::new(TrackerConfig::default());
                // Warm up with one batch to create tracks
                let _ = tracker.step(0.0, &make_batch(n, 0.0));
                // Measure a full step with established tracks
                let batch = make_batch(n, 0.1);
                black_box(tracker.step(0.1, &batch))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tracker);
criterion_main!(benches);
