use crate::{
    dsp::oscillator::OscillatorBlock,
    graph::node::{GraphNode, RenderCtx},
};

/*
LFO (Low Frequency Oscillator)
==============================

An oscillator at a fixed sub-audio rate whose output drives a parameter
instead of reaching the speakers. It ignores the note frequency in the
render context entirely, so every voice's vibrato runs at the same speed
whatever key is held.

Output is bipolar, -1..+1. The consumer scales it to parameter units:

    vibrato:  frequency_hz = f0 + depth_hz * lfo

Typical rates:

    0.1 - 0.5 Hz    slow sweeps
    4 - 7 Hz        vibrato
    > 15 Hz         starts to sound like FM rather than wobble

Each LfoNode starts at phase zero when built. Voices are built at note-on,
so the vibrato is effectively key-synced.
*/

pub struct LfoNode {
    osc: OscillatorBlock,
    frequency: f32,
}

impl LfoNode {
    pub fn sine(frequency: f32) -> Self {
        Self {
            osc: OscillatorBlock::sine(),
            frequency,
        }
    }

    pub fn triangle(frequency: f32) -> Self {
        Self {
            osc: OscillatorBlock::triangle(),
            frequency,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }
}

impl GraphNode for LfoNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.osc.next_sample(self.frequency, ctx.sample_rate);
        }
    }
}
