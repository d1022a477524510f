use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use rand::SeedableRng;
use spectral_beat_detector::{BeatDetector, DetectorConfig};

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    // Noise keeps every lag accumulator busy, so this is close to the
    // worst case per tick.
    let spectrum: Vec<f32> = (0..1024).map(|_| rng.random_range(0.0..1.0)).collect();

    let mut detector = BeatDetector::new(DetectorConfig::default()).unwrap();
    c.bench_function(
        "process one 1024-bin spectrum frame (real-time budget ~23ms)",
        |b| {
            b.iter(|| {
                let _ = detector.update_and_detect_beat(black_box(&spectrum));
            })
        },
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
