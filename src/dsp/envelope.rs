use crate::{dsp::automation::AutomationLane, graph::node::RenderCtx};

/*
Scheduled ADSR Envelope
=======================

The envelope is not a per-sample state machine. Instead, note_on and note_off
write ramps onto an automation lane at absolute render-clock times, and the
render thread just reads the lane back. This keeps retriggers, early
releases and sample-accurate timing in one place.

The Shape
---------

  level
   0.6 ┐    ╱╲
       │   ╱  `.
       │  ╱     `-._
   S   │ ╱          `------------.
       │╱                         `.__
   0.0 └──────────────────────────────`──→ t
       t0  +A   +A+D      note_off    +R

  attack   LINEAR from 0 to the fixed peak of 0.6
  decay    EXPONENTIAL from 0.6 down to max(sustain, 0.001)
  sustain  hold
  release  EXPONENTIAL from the live level down to 0.0001

The peak sits at 0.6 rather than 1.0 so a handful of simultaneous voices
can sum without clipping the master stage.

Why the floors?
---------------

An exponential ramp multiplies by a constant factor per unit time, so it can
never reach zero (or start from it). Sustain is floored at 0.001 (-60 dB) and
release lands on 0.0001 (-80 dB), both inaudible under the reverb tail.

Releasing Early
---------------

note_off at time t reads the lane's value at t BEFORE touching anything,
cancels every ramp point at or after t, pins that value at t and ramps down
from there. A note released 1 ms into its attack fades from wherever the
attack had reached; it never jumps to the peak or to sustain first.

    level   attack interrupted
     0.6 ┐     .
         │   ╱ :  <- cancelled
   held  │  ●──╮
         │ ╱    `.
     0.0 └╱───────`-──→ t
          t0  t   t+R
*/

/// Fixed peak of the attack ramp.
pub const PEAK_LEVEL: f32 = 0.6;
/// Lowest sustain an exponential decay can land on.
pub const SUSTAIN_FLOOR: f32 = 0.001;
/// Level the release ramp ends at.
pub const RELEASE_FLOOR: f32 = 0.0001;

/// Attack, decay and sustain captured at trigger time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
}

impl EnvelopeShape {
    pub fn new(attack: f32, decay: f32, sustain: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
        }
    }

    /// Sustain level the decay ramp actually targets.
    pub fn sustain_target(&self) -> f32 {
        self.sustain.max(SUSTAIN_FLOOR)
    }
}

pub struct Envelope {
    lane: AutomationLane,
    shape: EnvelopeShape,
}

impl Envelope {
    pub fn new(shape: EnvelopeShape) -> Self {
        Self {
            lane: AutomationLane::new(0.0),
            shape,
        }
    }

    /// Schedule attack and decay starting at `time`.
    ///
    /// Anything already scheduled from `time` on is replaced, so a retrigger
    /// restarts the shape from zero.
    pub fn note_on(&mut self, time: f64) {
        let attack = self.shape.attack.max(0.0) as f64;
        let decay = self.shape.decay.max(0.0) as f64;

        self.lane.cancel_scheduled_values(time);
        self.lane.set_value_at(0.0, time);
        self.lane.linear_ramp_to(PEAK_LEVEL, time + attack);
        self.lane
            .exponential_ramp_to(self.shape.sustain_target(), time + attack + decay);
    }

    /// Release from the live level at `time`.
    ///
    /// Returns the time the release ramp reaches [`RELEASE_FLOOR`].
    pub fn note_off(&mut self, time: f64, release: f32) -> f64 {
        let end = time + release.max(0.0) as f64;
        self.lane.cancel_and_hold(time);
        self.lane.exponential_ramp_to(RELEASE_FLOOR, end);
        end
    }

    /// Render envelope values for the block starting at `ctx.time`.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        self.lane.prune(ctx.time);
        self.lane
            .fill(buffer, ctx.time, 1.0 / ctx.sample_rate as f64);
    }

    pub fn level_at(&self, time: f64) -> f32 {
        self.lane.value_at(time)
    }

    pub fn shape(&self) -> EnvelopeShape {
        self.shape
    }
}
