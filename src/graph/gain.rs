use crate::{
    dsp::automation::AutomationLane,
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Gain Stage
==========

Gain multiplies a source by a level that may change over time. The level
lives on an automation lane, so a gain stage can be a fixed mix weight, a
decaying transient, or anything in between:

    source ──→ (×) ──→ out
                ↑
          automation lane

  // Quiet octave partial: constant 0.15
  OscNode::sine().with_ratio(2.0).gain(0.15)

  // Hammer strike: 0.3 falling to 0.001 over 50 ms from note-on
  let mut lane = AutomationLane::new(0.3);
  lane.set_value_at(0.3, 0.0);
  lane.exponential_ramp_to(0.001, 0.05);
  noise.through(FilterNode::bandpass(1200.0, 1.0)).automated_gain(lane)

Lane times are RELATIVE to note-on. The voice is built before anyone knows
which render block it will start in; note_on(t) anchors the lane's zero at
render-clock time t. A constant gain skips the lane lookup entirely.
*/

pub struct Gain<S> {
    source: S,
    level: Level,
    buffer: Vec<f32>,
}

enum Level {
    Constant(f32),
    Automated { lane: AutomationLane, origin: f64 },
}

impl<S> Gain<S> {
    pub fn constant(source: S, level: f32) -> Self {
        Self {
            source,
            level: Level::Constant(level),
            buffer: Vec::new(),
        }
    }

    pub fn automated(source: S, lane: AutomationLane) -> Self {
        Self {
            source,
            level: Level::Automated { lane, origin: 0.0 },
            buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Level at `time`.
    pub fn level_at(&self, time: f64) -> f32 {
        match &self.level {
            Level::Constant(level) => *level,
            Level::Automated { lane, origin } => lane.value_at(time - *origin),
        }
    }
}

impl<S: GraphNode> GraphNode for Gain<S> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);

        match &mut self.level {
            Level::Constant(level) => {
                for sample in out.iter_mut() {
                    *sample *= *level;
                }
            }
            Level::Automated { lane, origin } => {
                lane.prune(ctx.time - *origin);
                let dt = 1.0 / ctx.sample_rate as f64;
                let mut start = ctx.time - *origin;
                for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
                    let levels = &mut self.buffer[..chunk.len()];
                    lane.fill(levels, start, dt);
                    for (sample, &level) in chunk.iter_mut().zip(levels.iter()) {
                        *sample *= level;
                    }
                    start += chunk.len() as f64 * dt;
                }
            }
        }
    }

    fn note_on(&mut self, time: f64) {
        if let Level::Automated { origin, .. } = &mut self.level {
            *origin = time;
        }
        self.source.note_on(time);
    }

    fn node_count(&self) -> usize {
        self.source.node_count() + 1
    }
}
