//! Benchmarks for autocorrelation pitch detection.
//!
//! Quadratic in window length; 2048 is the microphone default.

use std::{f32::consts::TAU, hint::black_box};

use criterion::{BenchmarkId, Criterion};
use keyvox::pitch::PitchDetector;

pub fn bench_pitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/pitch");
    let sample_rate = 44_100.0;

    for window in [1_024, 2_048] {
        let tone: Vec<f32> = (0..window)
            .map(|i| 0.5 * (TAU * 220.0 * i as f32 / sample_rate).sin())
            .collect();
        let mut detector = PitchDetector::new();

        group.bench_with_input(BenchmarkId::new("detect", window), &window, |b, _| {
            b.iter(|| detector.detect(black_box(&tone), sample_rate))
        });
    }

    group.finish();
}
