use crate::{
    dsp::envelope::{Envelope, EnvelopeShape},
    graph::{
        mix::Sum,
        node::{midi_note_to_freq, GraphNode, RenderCtx},
    },
    MAX_BLOCK_SIZE,
};

/// Extra time a released voice stays connected after its release ramp ends.
pub const TEARDOWN_MARGIN: f64 = 0.1;

/// Identity of one voice instance. A retriggered note gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Held,         // Key down, envelope in attack/decay/sustain
    Releasing,    // Key released, release ramp scheduled
    Disconnected, // Torn down, renders nothing
}

/// One sounding note: its timbre layers feeding a dedicated envelope stage.
///
/// Voices are built on the control thread without knowing when they will
/// start. The render thread calls [`Voice::start`] with its clock, and every
/// time-dependent node anchors itself there.
pub struct Voice {
    id: VoiceId,
    note: u8,
    frequency: f32,
    layers: Sum,
    envelope: Envelope,
    state: VoiceState,
    started_at: Option<f64>,
    teardown_at: Option<f64>,
    layer_buffer: Vec<f32>,
    envelope_buffer: Vec<f32>,
}

impl Voice {
    pub fn new(id: VoiceId, note: u8, layers: Sum, shape: EnvelopeShape) -> Self {
        Self {
            id,
            note,
            frequency: midi_note_to_freq(note),
            layers,
            envelope: Envelope::new(shape),
            state: VoiceState::Held,
            started_at: None,
            teardown_at: None,
            layer_buffer: vec![0.0; MAX_BLOCK_SIZE],
            envelope_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Trigger every layer and the envelope at render-clock `time`.
    pub fn start(&mut self, time: f64) {
        self.layers.note_on(time);
        self.envelope.note_on(time);
        self.started_at = Some(time);
    }

    /// Release from the live level at `time`.
    ///
    /// Returns the teardown deadline: end of the release ramp plus
    /// [`TEARDOWN_MARGIN`]. Releasing twice keeps the first deadline.
    pub fn release(&mut self, time: f64, release: f32) -> f64 {
        if let Some(deadline) = self.teardown_at {
            return deadline;
        }
        let end = self.envelope.note_off(time, release);
        let deadline = end + TEARDOWN_MARGIN;
        self.state = VoiceState::Releasing;
        self.teardown_at = Some(deadline);
        deadline
    }

    /// Add this voice's output into `out`.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if self.state == VoiceState::Disconnected {
            return;
        }
        let ctx = RenderCtx {
            frequency: self.frequency,
            ..*ctx
        };

        let mut offset = 0;
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            let n = chunk.len();
            let chunk_ctx = ctx.at(ctx.frame_time(offset));
            let layers = &mut self.layer_buffer[..n];
            let levels = &mut self.envelope_buffer[..n];

            self.layers.render_block(layers, &chunk_ctx);
            self.envelope.render(levels, &chunk_ctx);
            for ((o, &x), &level) in chunk.iter_mut().zip(layers.iter()).zip(levels.iter()) {
                *o += x * level;
            }
            offset += n;
        }
    }

    /// Stop producing sound and drop out of the node count.
    pub fn disconnect(&mut self) {
        self.state = VoiceState::Disconnected;
    }

    /// True once the clock has reached the teardown deadline.
    pub fn is_expired(&self, time: f64) -> bool {
        self.teardown_at.is_some_and(|deadline| time >= deadline)
    }

    /// Connected nodes: every layer node plus the envelope gain stage.
    pub fn node_count(&self) -> usize {
        match self.state {
            VoiceState::Disconnected => 0,
            _ => self.layers.node_count() + 1,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    pub fn teardown_at(&self) -> Option<f64> {
        self.teardown_at
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}
