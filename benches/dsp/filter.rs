//! Benchmarks for the state-variable filter.
//!
//! `fixed` reuses one set of coefficients per block, as the formant bands
//! do. `swept` recomputes them every sample, as the effects bus does while a
//! cutoff change glides.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keyvox::dsp::filter::{Coefficients, SVFilter};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let sample_rate = 48_000.0;

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut buffer = input.clone();

        let mut filter = SVFilter::lowpass(2_800.0, 0.5);
        let coefficients = Coefficients::new(2_800.0, 0.5, sample_rate);
        group.bench_with_input(BenchmarkId::new("lowpass_fixed", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = filter.process(black_box(x), coefficients);
                }
            })
        });

        let mut filter = SVFilter::bandpass(1_150.0, 12.0);
        let coefficients = Coefficients::new(1_150.0, 12.0, sample_rate);
        group.bench_with_input(BenchmarkId::new("bandpass_fixed", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = filter.process(black_box(x), coefficients);
                }
            })
        });

        let cutoffs: Vec<f32> = (0..size)
            .map(|i| 2_800.0 - 2_000.0 * i as f32 / size as f32)
            .collect();
        let mut filter = SVFilter::lowpass(2_800.0, 0.5);
        group.bench_with_input(BenchmarkId::new("lowpass_swept", size), &size, |b, _| {
            b.iter(|| {
                for ((out, &x), &cutoff) in buffer.iter_mut().zip(&input).zip(&cutoffs) {
                    let coefficients = Coefficients::new(cutoff, 0.5, sample_rate);
                    *out = filter.process(black_box(x), coefficients);
                }
            })
        });
    }

    group.finish();
}
