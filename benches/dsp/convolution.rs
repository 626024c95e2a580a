//! Benchmarks for the partitioned reverb convolver.
//!
//! Cost grows with impulse length; 2.5 s is the default reverb.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keyvox::dsp::{
    convolution::{PartitionedConvolver, DEFAULT_PARTITION},
    impulse::reverb_impulse,
};

use crate::BLOCK_SIZES;

pub fn bench_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolution");
    let sample_rate = 48_000.0;

    for seconds in [0.5, 2.5] {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut kernels = reverb_impulse(sample_rate, seconds, 4.0, &mut rng);
        PartitionedConvolver::normalize(&mut kernels);
        let mut convolver = PartitionedConvolver::new(&kernels, DEFAULT_PARTITION);

        for &size in BLOCK_SIZES {
            let input: Vec<f32> = (0..size).map(|_| rng.f32() * 2.0 - 1.0).collect();
            let mut left = vec![0.0f32; size];
            let mut right = vec![0.0f32; size];
            let id = BenchmarkId::new(format!("stereo_{seconds}s"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    convolver.process(black_box(&input), &mut [&mut left[..], &mut right[..]]);
                })
            });
        }
    }

    group.finish();
}
