//! Benchmarks for the full render path.
//!
//! A chord held through the engine: control queue, every voice, the shared
//! filter, the reverb and the analyser tap, pulled through the offline
//! output.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keyvox::{
    io::{FeedInput, OfflineOutput},
    Engine, EngineConfig,
};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");
    let sample_rate = 48_000.0;

    for voices in [1usize, 4, 10] {
        let (output, audio) = OfflineOutput::new(sample_rate);
        let (input, _feed) = FeedInput::new(sample_rate);
        let config = EngineConfig::default().with_seed(1);
        let mut engine = Engine::with_io(config, Box::new(output), Box::new(input));
        for i in 0..voices {
            engine.note_on(48 + 4 * i as u8);
        }

        for &size in BLOCK_SIZES {
            let mut left = vec![0.0f32; size];
            let mut right = vec![0.0f32; size];
            let id = BenchmarkId::new(format!("chord_{voices}"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| audio.render_into(black_box(&mut left), black_box(&mut right)))
            });
        }
    }

    group.finish();
}
