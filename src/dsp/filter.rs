use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
| type      | passes          | rejects      | output used         |
| --------- | --------------- | ------------ | ------------------- |
| low-pass  | below cutoff    | above cutoff | v2                  |
| band-pass | around cutoff   | both sides   | k * v1 (0 dB peak)  |

Damping is derived from Q as k = 1 / Q. Q = 0.707 is maximally flat;
larger Q rings at the cutoff. Q is a linear factor: the low-pass gain at
the cutoff is Q itself, so Q 8 peaks about 18 dB up. It is not read as a
dB value. The band-pass output is scaled by k so the
centre frequency passes at unity regardless of Q, matching a constant-peak
biquad band-pass.

Q is floored and the cutoff is held below Nyquist so extreme settings never
turn the state into NaN.
*/

const MIN_Q: f32 = 1e-4;
const MIN_CUTOFF: f32 = 1.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    BandPass,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
}

/// Integrator gain `g` and damping `k` for one cutoff/Q pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub g: f32,
    pub k: f32,
}

impl Coefficients {
    pub fn new(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let nyquist_guard = sample_rate * 0.49;
        let cutoff = cutoff_hz.clamp(MIN_CUTOFF, nyquist_guard.max(MIN_CUTOFF));
        let g = (PI * cutoff / sample_rate).tan();
        let k = 1.0 / q.max(MIN_Q);
        Self { g, k }
    }
}

pub struct SVFilter {
    ic1eq: f32,
    ic2eq: f32,

    pub cutoff_hz: f32,
    pub q: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, q: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            q,
            filter_type,
        }
    }

    pub fn lowpass(cutoff_hz: f32, q: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, q)
    }

    pub fn bandpass(cutoff_hz: f32, q: f32) -> Self {
        Self::new(FilterType::BandPass, cutoff_hz, q)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn next_sample(&mut self, sample: f32, coefficients: Coefficients) -> FilterOutputs {
        let Coefficients { g, k } = coefficients;
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: k * v1,
        }
    }

    /// Filter one sample with per-sample coefficients.
    #[inline]
    pub fn process(&mut self, sample: f32, coefficients: Coefficients) -> f32 {
        let outputs = self.next_sample(sample, coefficients);
        match self.filter_type {
            FilterType::LowPass => outputs.lowpass,
            FilterType::BandPass => outputs.bandpass,
        }
    }

    /// Filter `buffer` in place at the stored cutoff and Q.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let coefficients = Coefficients::new(self.cutoff_hz, self.q, ctx.sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, coefficients);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorBlock;

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len() / 2;
        buffer[skip..]
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    fn sine(freq: f32, len: usize) -> (Vec<f32>, RenderCtx) {
        let ctx = RenderCtx::from_freq(48_000.0, freq);
        let mut osc = OscillatorBlock::sine();
        let mut buffer = vec![0.0f32; len];
        osc.render(&mut buffer, &ctx);
        (buffer, ctx)
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut filter = SVFilter::lowpass(500.0, 0.707);
        let mut buffer = vec![1.0; 2048];
        let ctx = RenderCtx::from_freq(48_000.0, 440.0);

        filter.render(&mut buffer, &ctx);

        assert!(buffer[2047] > 0.99, "got {}", buffer[2047]);
    }

    #[test]
    fn lowpass_filters_high_freq() {
        let mut filter = SVFilter::lowpass(500.0, 0.707);
        let (mut buffer, ctx) = sine(5_000.0, 1024);

        filter.render(&mut buffer, &ctx);

        let peak = peak_after_transient(&buffer);
        assert!(peak < 0.05, "expected high freq attenuation, got peak: {peak}");
    }

    #[test]
    fn bandpass_passes_centre_at_unity() {
        for q in [1.0, 8.0, 12.0] {
            let mut filter = SVFilter::bandpass(1_000.0, q);
            let (mut buffer, ctx) = sine(1_000.0, 48_000);
            filter.render(&mut buffer, &ctx);

            let peak = peak_after_transient(&buffer);
            assert!(
                (peak - 1.0).abs() < 0.05,
                "Q {q}: centre should pass at unity, got {peak}"
            );
        }
    }

    #[test]
    fn bandpass_rejects_off_centre() {
        let mut filter = SVFilter::bandpass(1_000.0, 10.0);
        let (mut buffer, ctx) = sine(200.0, 4_800);
        filter.render(&mut buffer, &ctx);

        let peak = peak_after_transient(&buffer);
        assert!(peak < 0.1, "200 Hz through a Q10 band at 1 kHz, got {peak}");
    }

    #[test]
    fn resonance_boosts_cutoff() {
        let (input, ctx) = sine(1_000.0, 4_800);

        let mut flat = SVFilter::lowpass(1_000.0, 0.5);
        let mut low = input.clone();
        flat.render(&mut low, &ctx);

        let mut peaky = SVFilter::lowpass(1_000.0, 8.0);
        let mut high = input;
        peaky.render(&mut high, &ctx);

        assert!(
            peak_after_transient(&high) > peak_after_transient(&low) * 4.0,
            "Q 8 should ring at the cutoff"
        );
    }

    #[test]
    fn lowpass_gain_at_cutoff_is_linear_q() {
        for q in [2.0, 8.0] {
            let mut filter = SVFilter::lowpass(1_000.0, q);
            let (mut buffer, ctx) = sine(1_000.0, 48_000);
            filter.render(&mut buffer, &ctx);

            let peak = peak_after_transient(&buffer);
            assert!(
                (peak - q).abs() < q * 0.05,
                "Q {q}: expected gain {q} at the cutoff, got {peak}"
            );
        }
    }

    #[test]
    fn degenerate_parameters_stay_finite() {
        let (input, ctx) = sine(440.0, 1024);
        for (cutoff, q) in [(0.0, 0.0), (100_000.0, 0.5), (-50.0, 1000.0)] {
            let mut filter = SVFilter::lowpass(cutoff, q);
            let mut buffer = input.clone();
            filter.render(&mut buffer, &ctx);
            assert!(
                buffer.iter().all(|s| s.is_finite()),
                "cutoff {cutoff}, q {q} produced non-finite output"
            );
        }
    }
}
