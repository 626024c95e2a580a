use crate::graph::node::{GraphNode, RenderCtx};

/*
Serial Chain (Through)
======================

Through renders a source into the buffer, then lets a processor transform
that buffer in place:

    [source] ──→ [processor] ──→ out

Formant bands and the hammer transient are both built this way:

    OscNode::sawtooth().through(FilterNode::bandpass(800.0, 10.0))
    NoiseBurst::new(noise).through(FilterNode::bandpass(1200.0, 1.0))

Use Sum for parallel layers and Gain for levels; Through is only for audio
flowing from one stage into the next.
*/

pub struct Through<S, F> {
    source: S,
    processor: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, processor: F) -> Self {
        Self { source, processor }
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.processor.render_block(out, ctx);
    }

    fn note_on(&mut self, time: f64) {
        self.source.note_on(time);
        self.processor.note_on(time);
    }

    fn node_count(&self) -> usize {
        self.source.node_count() + self.processor.node_count()
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{extensions::NodeExt, filter::FilterNode, node::RenderCtx, oscillator::OscNode};
    use crate::graph::node::GraphNode;

    #[test]
    fn renders_source_then_processor() {
        let ctx = RenderCtx::from_freq(48_000.0, 5_000.0);
        let mut dry = OscNode::sine();
        let mut wet = OscNode::sine().through(FilterNode::lowpass(200.0, 0.707));

        let mut a = vec![0.0; 1024];
        let mut b = vec![0.0; 1024];
        dry.render_block(&mut a, &ctx);
        wet.render_block(&mut b, &ctx);

        let peak = |s: &[f32]| s[512..].iter().fold(0.0f32, |m, x| m.max(x.abs()));
        assert!(peak(&b) < peak(&a) * 0.1);
    }

    #[test]
    fn counts_both_stages() {
        let node = OscNode::sine().through(FilterNode::bandpass(800.0, 10.0));
        assert_eq!(node.node_count(), 2);
    }
}
