use crate::{
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Summing Junction
================

Sum adds any number of sources together at unity gain. It is the point
where a voice's layers meet before the envelope stage:

    body ─────────┐
    octave ───────┼──→ (+) ──→ envelope
    hammer ───────┘

Weights belong on the inputs (`.gain()`), not on the junction, so each
layer carries its own level and the sum stays a plain sum.

Sources are rendered one at a time into a scratch buffer and accumulated;
nothing is allocated after construction.
*/

pub struct Sum {
    inputs: Vec<Box<dyn GraphNode>>,
    scratch: Vec<f32>,
}

impl Sum {
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            scratch: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Connect another source.
    pub fn with<N: GraphNode + 'static>(mut self, node: N) -> Self {
        self.inputs.push(Box::new(node));
        self
    }

    pub fn push<N: GraphNode + 'static>(&mut self, node: N) {
        self.inputs.push(Box::new(node));
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl Default for Sum {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphNode for Sum {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        out.fill(0.0);
        let mut start = 0;
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let chunk_ctx = ctx.at(ctx.frame_time(start));
            let scratch = &mut self.scratch[..chunk.len()];
            for input in &mut self.inputs {
                scratch.fill(0.0);
                input.render_block(scratch, &chunk_ctx);
                for (o, s) in chunk.iter_mut().zip(scratch.iter()) {
                    *o += s;
                }
            }
            start += chunk.len();
        }
    }

    fn note_on(&mut self, time: f64) {
        for input in &mut self.inputs {
            input.note_on(time);
        }
    }

    fn node_count(&self) -> usize {
        1 + self.inputs.iter().map(|n| n.node_count()).sum::<usize>()
    }
}
