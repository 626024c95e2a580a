use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
Phase-Accumulator Oscillator
============================

Every periodic waveform here is a function of a single phase value in [0, 1).
Each sample the phase advances by `frequency / sample_rate` and wraps:

    phase += f / sr
    if phase >= 1.0 { phase -= 1.0 }

The output is read BEFORE the phase advances, so sample n of a freshly
created sine is exactly sin(2 pi f n / sr).

    sine      sin(2 pi phase)
    saw       2 phase - 1                (rising ramp)
    square    +1 for phase < 0.5, else -1
    triangle  1 - 4 |phase - 0.5|        (peaks at phase 0.5)

Saw and square jump instantly once per cycle, which aliases badly at high
pitches. A polyBLEP residual (a two-sample polynomial correction centred on
each discontinuity) is subtracted to round the step off:

    t < dt        residual =  2t/dt - (t/dt)^2 - 1
    t > 1 - dt    residual = ((t-1)/dt)^2 + 2(t-1)/dt + 1

Triangle and sine are continuous and left untouched.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Saw,
    Square,
    Triangle,
}

pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
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

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Produce one sample at `frequency` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let dt = (frequency / sample_rate).abs().min(0.5);
        let t = self.phase;

        let value = match self.waveform {
            OscillatorWaveform::Sine => (TAU * t).sin(),
            OscillatorWaveform::Saw => 2.0 * t - 1.0 - poly_blep(t, dt),
            OscillatorWaveform::Square => {
                let naive = if t < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(t, dt) - poly_blep((t + 0.5).fract(), dt)
            }
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (t - 0.5).abs(),
        };

        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        value
    }

    /// Fill `buffer` at the context's frequency.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(ctx.frequency, ctx.sample_rate);
        }
    }
}

#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    if t < dt {
        let x = t / dt;
        2.0 * x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + 2.0 * x + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(waveform: OscillatorWaveform, freq: f32, len: usize) -> Vec<f32> {
        let mut osc = OscillatorBlock::new(waveform);
        let ctx = RenderCtx::from_freq(48_000.0, freq);
        let mut buffer = vec![0.0; len];
        osc.render(&mut buffer, &ctx);
        buffer
    }

    #[test]
    fn all_waveforms_stay_in_range() {
        for waveform in [
            OscillatorWaveform::Sine,
            OscillatorWaveform::Saw,
            OscillatorWaveform::Square,
            OscillatorWaveform::Triangle,
        ] {
            let buffer = render(waveform, 1_000.0, 2048);
            for &sample in &buffer {
                assert!(
                    sample.is_finite() && sample.abs() <= 1.001,
                    "{waveform:?} produced out of range sample {sample}"
                );
            }
        }
    }

    #[test]
    fn triangle_starts_at_trough() {
        let buffer = render(OscillatorWaveform::Triangle, 100.0, 4);
        assert!((buffer[0] + 1.0).abs() < 1e-6, "got {}", buffer[0]);
        assert!(buffer[1] > buffer[0]);
    }

    #[test]
    fn square_has_zero_mean_over_whole_cycles() {
        // 480 Hz at 48 kHz is exactly 100 samples per cycle
        let buffer = render(OscillatorWaveform::Square, 480.0, 4800);
        let mean: f32 = buffer.iter().sum::<f32>() / buffer.len() as f32;
        assert!(mean.abs() < 0.01, "mean was {mean}");
    }
}
