//! Benchmarks for the ADSR envelope.
//!
//! The envelope renders from its automation lane, so cost depends on which
//! segment the block falls in.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keyvox::dsp::envelope::{Envelope, EnvelopeShape};
use keyvox::graph::node::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Linear attack
        let mut env = Envelope::new(EnvelopeShape::new(0.5, 1.5, 0.3));
        env.note_on(0.0);
        let attack = ctx.at(0.1);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(&attack));
            })
        });

        // Exponential decay towards sustain
        let mut env = Envelope::new(EnvelopeShape::new(0.002, 1.5, 0.3));
        env.note_on(0.0);
        let decay = ctx.at(0.5);
        group.bench_with_input(BenchmarkId::new("decay", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(&decay));
            })
        });

        // Exponential release after note-off
        let mut env = Envelope::new(EnvelopeShape::new(0.002, 0.1, 0.3));
        env.note_on(0.0);
        env.note_off(0.5, 2.0);
        let release = ctx.at(1.0);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(&release));
            })
        });
    }

    group.finish();
}
