use std::sync::Arc;

use crate::{
    dsp::{automation::AutomationLane, envelope::EnvelopeShape, impulse::noise_burst},
    graph::{
        extensions::NodeExt,
        filter::FilterNode,
        formant::{Formant, FormantBank},
        mix::Sum,
        node::GraphNode,
        noise::NoiseBurst,
        oscillator::OscNode,
    },
    settings::{EngineConfig, SynthSettings},
    synth::voice::{Voice, VoiceId},
};

/*
Voice Graphs
============

Every voice ends in its own envelope stage. What feeds it depends on the
oscillator type.

Default timbre (sine / square / sawtooth / triangle):

    osc(type, detune - 2¢) ─────────────────────────────┐
    sine ×2 ──────────────────────────── (×0.15) ───────┤
    sine ×3 ──────────────────────────── (×0.04) ───────┼──→ (+) ──→ envelope
    noise burst ──→ [bp 1200 Hz, Q1] ──→ (0.3 ↘ 0.001) ─┘
                                          50 ms

  The primary layer sits two cents flat of the requested detune, so it
  beats gently against the in-tune octave partial. The 3x partial is
  optional (EngineConfig::third_partial). The hammer is a one-shot burst
  of the shared noise buffer with its own 50 ms exponential decay,
  independent of the main envelope.

Vocal timbre:

    saw + vibrato(5.5 Hz, ±2 Hz) ──→ formants {800, 1150, 2900 Hz} ──→ envelope

Settings are read once, here. Attack, decay, sustain, detune and the
timbre are fixed for the life of the voice; the shared bus parameters
(cutoff, resonance, reverb) are live.
*/

/// Detune bias of the primary layer, in cents.
pub const CHORUS_BIAS_CENTS: f32 = -2.0;
/// Level of the 2x sine partial.
pub const OCTAVE_PARTIAL_GAIN: f32 = 0.15;
/// Level of the optional 3x sine partial.
pub const THIRD_PARTIAL_GAIN: f32 = 0.04;

const HAMMER_CENTRE_HZ: f32 = 1_200.0;
const HAMMER_Q: f32 = 1.0;
const HAMMER_PEAK: f32 = 0.3;
const HAMMER_FLOOR: f32 = 0.001;
const HAMMER_DECAY: f64 = 0.05;

const VIBRATO_RATE_HZ: f32 = 5.5;
const VIBRATO_DEPTH_HZ: f32 = 2.0;

/// Open "ah" vowel.
pub const VOWEL_FORMANTS: [Formant; 3] = [
    Formant::new(800.0, 10.0, 0.6),
    Formant::new(1_150.0, 12.0, 0.4),
    Formant::new(2_900.0, 8.0, 0.2),
];

pub struct VoiceBuilder {
    noise: Arc<[f32]>,
    third_partial: bool,
    next_id: u64,
}

impl VoiceBuilder {
    pub fn new(noise: Arc<[f32]>, third_partial: bool) -> Self {
        Self {
            noise,
            third_partial,
            next_id: 0,
        }
    }

    /// Generate the hammer noise buffer for `sample_rate`.
    pub fn from_config(config: &EngineConfig, sample_rate: f32, rng: &mut fastrand::Rng) -> Self {
        let noise = noise_burst(sample_rate, config.noise_seconds, rng);
        Self::new(Arc::from(noise), config.third_partial)
    }

    /// Assemble a fresh voice for `note` from the current settings.
    pub fn build_voice(&mut self, note: u8, settings: &SynthSettings) -> Voice {
        let layers = match settings.osc_type.waveform() {
            Some(waveform) => {
                let primary = OscNode::new(waveform).with_detune(settings.detune + CHORUS_BIAS_CENTS);
                self.additive_layers(primary)
            }
            None => Self::vocal_layers(),
        };

        self.next_id += 1;
        let shape = EnvelopeShape::new(settings.attack, settings.decay, settings.sustain);
        Voice::new(VoiceId(self.next_id), note, layers, shape)
    }

    fn additive_layers(&self, primary: OscNode) -> Sum {
        let mut layers = Sum::new()
            .with(primary)
            .with(OscNode::sine().with_ratio(2.0).gain(OCTAVE_PARTIAL_GAIN));
        if self.third_partial {
            layers.push(OscNode::sine().with_ratio(3.0).gain(THIRD_PARTIAL_GAIN));
        }
        layers.push(self.hammer());
        layers
    }

    fn hammer(&self) -> impl GraphNode + 'static {
        let mut strike = AutomationLane::new(HAMMER_PEAK);
        strike.set_value_at(HAMMER_PEAK, 0.0);
        strike.exponential_ramp_to(HAMMER_FLOOR, HAMMER_DECAY);

        NoiseBurst::new(self.noise.clone())
            .through(FilterNode::bandpass(HAMMER_CENTRE_HZ, HAMMER_Q))
            .automated_gain(strike)
    }

    fn vocal_layers() -> Sum {
        Sum::new().with(
            OscNode::sawtooth()
                .with_vibrato(VIBRATO_RATE_HZ, VIBRATO_DEPTH_HZ)
                .through(FormantBank::new(&VOWEL_FORMANTS)),
        )
    }
}
