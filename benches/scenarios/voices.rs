//! Benchmarks for complete voices.
//!
//! Each voice is built exactly as a key press builds it, then rendered while
//! held. The default timbre has the most nodes; vocal adds the formant bank.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use keyvox::{
    dsp::impulse::noise_burst,
    graph::node::RenderCtx,
    settings::{OscType, Preset, SettingsPatch, SynthSettings},
    synth::builder::VoiceBuilder,
};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let sample_rate = 48_000.0;
    let mut rng = fastrand::Rng::with_seed(1);
    let noise: Arc<[f32]> = noise_burst(sample_rate, 0.1, &mut rng).into();
    let mut builder = VoiceBuilder::new(noise, true);

    let timbres = [
        ("piano", SynthSettings::default().merged(&Preset::Piano.patch())),
        ("synth", SynthSettings::default().merged(&Preset::Synth.patch())),
        (
            "vocal",
            SynthSettings::default().merged(&SettingsPatch::new().osc_type(OscType::Vocal)),
        ),
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        // Past the hammer transient, into the decay
        let ctx = RenderCtx::from_freq(sample_rate, 0.0).at(0.2);

        for (name, settings) in &timbres {
            let mut voice = builder.build_voice(57, settings);
            voice.start(0.0);
            group.bench_with_input(BenchmarkId::new(*name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.fill(0.0);
                    voice.render(black_box(&mut buffer), black_box(&ctx));
                })
            });
        }
    }

    group.finish();
}
