use crate::{
    dsp::filter::{Coefficients, SVFilter},
    graph::node::{GraphNode, RenderCtx},
};

/*
Formant Bank
============

A parallel set of fixed band-pass resonators fed by ONE source:

                  ┌──→ [bp 800 Hz, Q10]  ──→ (×0.6) ──┐
    source ──→ x ─┼──→ [bp 1150 Hz, Q12] ──→ (×0.4) ──┼──→ (+) ──→ out
                  └──→ [bp 2900 Hz, Q8]  ──→ (×0.2) ──┘

The bank is a processor: put it after the source with `.through()`. Each
band filters the same input sample, so one oscillator (and one vibrato LFO)
drives every formant.

Example usage:
  OscNode::sawtooth()
      .with_vibrato(5.5, 2.0)
      .through(FormantBank::new(&[
          Formant::new(800.0, 10.0, 0.6),
          Formant::new(1150.0, 12.0, 0.4),
          Formant::new(2900.0, 8.0, 0.2),
      ]))
*/

/// One resonance: centre frequency, Q and output weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formant {
    pub centre_hz: f32,
    pub q: f32,
    pub gain: f32,
}

impl Formant {
    pub const fn new(centre_hz: f32, q: f32, gain: f32) -> Self {
        Self { centre_hz, q, gain }
    }
}

struct Band {
    formant: Formant,
    filter: SVFilter,
    coefficients: Coefficients,
    sample_rate: f32,
}

pub struct FormantBank {
    bands: Vec<Band>,
}

impl FormantBank {
    pub fn new(formants: &[Formant]) -> Self {
        let bands = formants
            .iter()
            .map(|&formant| Band {
                formant,
                filter: SVFilter::bandpass(formant.centre_hz, formant.q),
                coefficients: Coefficients { g: 0.0, k: 0.0 },
                sample_rate: 0.0,
            })
            .collect();
        Self { bands }
    }

    pub fn formants(&self) -> impl Iterator<Item = Formant> + '_ {
        self.bands.iter().map(|b| b.formant)
    }
}

impl GraphNode for FormantBank {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        for band in &mut self.bands {
            if band.sample_rate != ctx.sample_rate {
                band.coefficients =
                    Coefficients::new(band.formant.centre_hz, band.formant.q, ctx.sample_rate);
                band.sample_rate = ctx.sample_rate;
            }
        }

        for sample in out.iter_mut() {
            let input = *sample;
            *sample = self
                .bands
                .iter_mut()
                .map(|band| band.filter.process(input, band.coefficients) * band.formant.gain)
                .sum();
        }
    }

    fn node_count(&self) -> usize {
        // Each band is a filter plus its gain stage
        self.bands.len() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{extensions::NodeExt, oscillator::OscNode};

    fn steady_peak(buffer: &[f32]) -> f32 {
        buffer[buffer.len() / 2..]
            .iter()
            .fold(0.0f32, |m, x| m.max(x.abs()))
    }

    #[test]
    fn passes_energy_near_formants() {
        let bank = || FormantBank::new(&[Formant::new(800.0, 10.0, 0.6)]);
        let mut on = OscNode::sine().through(bank());
        let mut off = OscNode::sine().through(bank());

        let mut a = vec![0.0; 8_192];
        let mut b = vec![0.0; 8_192];
        on.render_block(&mut a, &RenderCtx::from_freq(44_100.0, 800.0));
        off.render_block(&mut b, &RenderCtx::from_freq(44_100.0, 200.0));

        assert!((steady_peak(&a) - 0.6).abs() < 0.05, "got {}", steady_peak(&a));
        assert!(steady_peak(&b) < 0.1, "got {}", steady_peak(&b));
    }

    #[test]
    fn counts_filters_and_gains() {
        let bank = FormantBank::new(&[
            Formant::new(800.0, 10.0, 0.6),
            Formant::new(1150.0, 12.0, 0.4),
            Formant::new(2900.0, 8.0, 0.2),
        ]);
        assert_eq!(bank.node_count(), 6);
        assert_eq!(bank.formants().count(), 3);
    }
}
