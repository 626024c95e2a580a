/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Context passed to graph nodes during rendering
///
/// Contains information about what to render:
/// - sample_rate: Audio sample rate (e.g., 44100.0)
/// - frequency: Pitch to render (Hz)
/// - time: Render-clock time of the first frame in the block, in seconds
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub time: f64,
}

impl RenderCtx {
    /// Create context from MIDI note
    pub fn from_note(sample_rate: f32, note: u8) -> Self {
        Self::from_freq(sample_rate, midi_note_to_freq(note))
    }

    /// Create context from direct frequency
    pub fn from_freq(sample_rate: f32, frequency: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            time: 0.0,
        }
    }

    /// Same context, starting at `time`.
    pub fn at(self, time: f64) -> Self {
        Self { time, ..self }
    }

    /// Render-clock time of frame `index` within the block.
    #[inline]
    pub fn frame_time(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }
}

/// Core trait for audio processing graph nodes
///
/// Sources write into `out`; processors (filters, gain stages) transform it
/// in place.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when the owning voice starts, at render-clock `time`
    ///
    /// Nodes with time-dependent behaviour anchor it here. Default does
    /// nothing.
    fn note_on(&mut self, _time: f64) {}

    /// Number of primitive nodes owned by this one, itself included.
    ///
    /// Voice teardown uses this to account for every node it disconnects.
    fn node_count(&self) -> usize {
        1
    }
}

/// Allow boxed graph nodes to be used as graph nodes (for dynamic dispatch)
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_on(&mut self, time: f64) {
        (**self).note_on(time)
    }

    fn node_count(&self) -> usize {
        (**self).node_count()
    }
}
