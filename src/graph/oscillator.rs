use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};
use crate::graph::lfo::LfoNode;
use crate::graph::node::{GraphNode, RenderCtx};
use crate::MAX_BLOCK_SIZE;

/*
Audio Oscillator
================

The raw sound source of every voice. An OscNode follows the note frequency
carried in RenderCtx unless pinned to a fixed frequency, and then applies,
in order:

  ratio     multiply the base frequency (2.0 = octave partial, 3.0 = twelfth)
  detune    shift by cents: f * 2^(cents / 1200)
  vibrato   add an LFO in Hz, per sample: f + depth * lfo[n]

Waveforms and their character:

  Sine       fundamental only; pure, hollow
  Triangle   odd harmonics at 1/n^2; soft, flute-like
  Square     odd harmonics at 1/n; woody, hollow but loud
  Sawtooth   every harmonic at 1/n; bright, buzzy, the usual filter food

Vibrato is additive in Hz, not cents, so a fixed depth is a wider interval
on low notes than on high ones. At 5.5 Hz and +/-2 Hz it reads as a gentle
singer's waver around A4.

Example usage:
  // Octave partial, quiet
  let partial = OscNode::sine().with_ratio(2.0).gain(0.15);

  // Chorus layer, two cents flat
  let body = OscNode::triangle().with_detune(-2.0);

  // Vocal source
  let source = OscNode::sawtooth().with_vibrato(5.5, 2.0);
*/

pub struct OscNode {
    osc: OscillatorBlock,
    /// Fixed frequency (Hz). If Some, ignores ctx.frequency.
    base_frequency: Option<f32>,
    /// Multiplier applied to the base frequency.
    ratio: f32,
    /// Detune in cents. 100 cents = 1 semitone.
    detune_cents: f32,
    vibrato: Option<Vibrato>,
}

struct Vibrato {
    lfo: LfoNode,
    depth_hz: f32,
    buffer: Vec<f32>,
}

impl OscNode {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            base_frequency: None,
            ratio: 1.0,
            detune_cents: 0.0,
            vibrato: None,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    /// Set a fixed frequency, ignoring the note pitch from RenderCtx.
    pub fn with_frequency(mut self, freq: f32) -> Self {
        self.base_frequency = Some(freq);
        self
    }

    /// Play at `ratio` times the base frequency.
    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    /// Set detune in cents (100 cents = 1 semitone).
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_cents = cents;
        self
    }

    /// Add a sine LFO at `rate_hz` to the frequency, scaled to `depth_hz`.
    pub fn with_vibrato(mut self, rate_hz: f32, depth_hz: f32) -> Self {
        self.vibrato = Some(Vibrato {
            lfo: LfoNode::sine(rate_hz),
            depth_hz,
            buffer: vec![0.0; MAX_BLOCK_SIZE],
        });
        self
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.osc.waveform()
    }

    /// Frequency before vibrato for a given context.
    pub fn frequency_for(&self, ctx: &RenderCtx) -> f32 {
        let base = self.base_frequency.unwrap_or(ctx.frequency) * self.ratio;
        if self.detune_cents != 0.0 {
            base * 2.0_f32.powf(self.detune_cents / 1200.0)
        } else {
            base
        }
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let frequency = self.frequency_for(ctx);

        match &mut self.vibrato {
            None => {
                for sample in out.iter_mut() {
                    *sample = self.osc.next_sample(frequency, ctx.sample_rate);
                }
            }
            Some(vibrato) => {
                for out_chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
                    let lfo = &mut vibrato.buffer[..out_chunk.len()];
                    vibrato.lfo.render_block(lfo, ctx);
                    for (sample, &m) in out_chunk.iter_mut().zip(lfo.iter()) {
                        let f = frequency + vibrato.depth_hz * m;
                        *sample = self.osc.next_sample(f, ctx.sample_rate);
                    }
                }
            }
        }
    }

    fn node_count(&self) -> usize {
        // The vibrato LFO and its depth gain are separate nodes in the graph
        if self.vibrato.is_some() {
            3
        } else {
            1
        }
    }
}
