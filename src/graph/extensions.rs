use crate::{
    dsp::automation::AutomationLane,
    graph::{gain::Gain, mix::Sum, node::GraphNode, through::Through},
};

pub trait NodeExt: GraphNode + Sized {
    /// Scale by a constant level.
    fn gain(self, level: f32) -> Gain<Self> {
        Gain::constant(self, level)
    }

    /// Scale by a time-varying level.
    fn automated_gain(self, lane: AutomationLane) -> Gain<Self> {
        Gain::automated(self, lane)
    }

    fn through<F: GraphNode>(self, processor: F) -> Through<Self, F> {
        Through::new(self, processor)
    }

    /// Start a summing junction with this node as its first input.
    fn sum<M: GraphNode + 'static>(self, other: M) -> Sum
    where
        Self: 'static,
    {
        Sum::new().with(self).with(other)
    }
}

impl<T: GraphNode> NodeExt for T {}
