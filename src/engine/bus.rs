use crate::{
    dsp::{
        automation::AutomationLane,
        convolution::{PartitionedConvolver, DEFAULT_PARTITION},
        filter::{Coefficients, SVFilter},
    },
    graph::node::RenderCtx,
    synth::message::BusParams,
    MAX_BLOCK_SIZE,
};

/*
Effects Bus
===========

Every voice sums into one shared chain:

    voices ──→ (+) ──→ [lowpass] ──┬─────────────────────────────→ (+) ──→ [master] ──→ L/R
                                   └──→ [convolver] ──→ (×reverb) ──┘

  - The lowpass cutoff and Q, and the reverb send, each live on an
    automation lane. Changes glide towards their new value with a 50 ms
    time constant instead of jumping, so sweeping a knob never clicks.
  - The dry path is mono, copied to both channels. The convolver holds a
    two-channel impulse response, so the wet path is true stereo.
  - The impulse response is normalised once when the bus is built and
    never changes afterwards.
*/

/// Time constant of parameter glides, in seconds.
pub const SMOOTHING_TIME_CONSTANT: f64 = 0.05;

pub struct EffectsBus {
    filter: SVFilter,
    cutoff: AutomationLane,
    resonance: AutomationLane,
    reverb: AutomationLane,
    convolver: PartitionedConvolver,
    master_gain: f32,

    cutoff_buffer: Vec<f32>,
    resonance_buffer: Vec<f32>,
    reverb_buffer: Vec<f32>,
    filtered: Vec<f32>,
    wet_left: Vec<f32>,
    wet_right: Vec<f32>,
}

impl EffectsBus {
    pub fn new(params: BusParams, impulse: [Vec<f32>; 2], master_gain: f32) -> Self {
        let mut kernels = impulse;
        PartitionedConvolver::normalize(&mut kernels);

        Self {
            filter: SVFilter::lowpass(params.cutoff, params.resonance),
            cutoff: AutomationLane::new(params.cutoff),
            resonance: AutomationLane::new(params.resonance),
            reverb: AutomationLane::new(params.reverb),
            convolver: PartitionedConvolver::new(&kernels, DEFAULT_PARTITION),
            master_gain,
            cutoff_buffer: vec![0.0; MAX_BLOCK_SIZE],
            resonance_buffer: vec![0.0; MAX_BLOCK_SIZE],
            reverb_buffer: vec![0.0; MAX_BLOCK_SIZE],
            filtered: vec![0.0; MAX_BLOCK_SIZE],
            wet_left: vec![0.0; MAX_BLOCK_SIZE],
            wet_right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Start gliding every parameter towards `params` at `time`.
    pub fn set_params(&mut self, params: BusParams, time: f64) {
        self.cutoff
            .set_target_at(params.cutoff, time, SMOOTHING_TIME_CONSTANT);
        self.resonance
            .set_target_at(params.resonance, time, SMOOTHING_TIME_CONSTANT);
        self.reverb
            .set_target_at(params.reverb, time, SMOOTHING_TIME_CONSTANT);
    }

    /// Parameter values in effect at `time`.
    pub fn params_at(&self, time: f64) -> BusParams {
        BusParams {
            cutoff: self.cutoff.value_at(time),
            resonance: self.resonance.value_at(time),
            reverb: self.reverb.value_at(time),
        }
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Run one block of the voice mix through the bus.
    ///
    /// `input`, `left` and `right` must be the same length, at most
    /// [`MAX_BLOCK_SIZE`].
    pub fn process(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        let n = input.len();
        let dt = 1.0 / ctx.sample_rate as f64;

        for lane in [&mut self.cutoff, &mut self.resonance, &mut self.reverb] {
            lane.prune(ctx.time);
        }
        self.cutoff.fill(&mut self.cutoff_buffer[..n], ctx.time, dt);
        self.resonance
            .fill(&mut self.resonance_buffer[..n], ctx.time, dt);
        self.reverb.fill(&mut self.reverb_buffer[..n], ctx.time, dt);

        let filtered = &mut self.filtered[..n];
        for (i, (out, &x)) in filtered.iter_mut().zip(input).enumerate() {
            let coefficients =
                Coefficients::new(self.cutoff_buffer[i], self.resonance_buffer[i], ctx.sample_rate);
            *out = self.filter.process(x, coefficients);
        }

        self.convolver.process(
            filtered,
            &mut [&mut self.wet_left[..n], &mut self.wet_right[..n]],
        );

        for i in 0..n {
            let dry = filtered[i];
            let send = self.reverb_buffer[i];
            left[i] = (dry + send * self.wet_left[i]) * self.master_gain;
            right[i] = (dry + send * self.wet_right[i]) * self.master_gain;
        }
    }
}
