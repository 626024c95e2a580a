use rtrb::{Consumer, Producer};

use crate::{
    analysis::scope::ScopeWriter,
    engine::{bus::EffectsBus, clock::RenderClock},
    graph::node::RenderCtx,
    synth::{message::EngineMessage, voice::Voice},
    MAX_BLOCK_SIZE,
};

/// Upper bound on simultaneously connected voices: one per MIDI note.
const VOICE_CAPACITY: usize = 128;

/// Render-thread half of the engine.
///
/// Owns every connected voice and the effects bus. Each block it drains
/// pending control messages, mixes all voices into the bus, publishes the
/// result to the scope, advances the clock and retires voices whose
/// teardown deadline has passed. Retired voices go back to the control
/// thread through the graveyard ring to be dropped there.
pub struct Renderer {
    rx: Consumer<EngineMessage>,
    graveyard: Producer<Box<Voice>>,
    voices: Vec<Box<Voice>>,
    bus: EffectsBus,
    scope: ScopeWriter,
    clock: RenderClock,
    mix: Vec<f32>,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Renderer {
    pub fn new(
        rx: Consumer<EngineMessage>,
        graveyard: Producer<Box<Voice>>,
        bus: EffectsBus,
        scope: ScopeWriter,
        clock: RenderClock,
    ) -> Self {
        Self {
            rx,
            graveyard,
            voices: Vec::with_capacity(VOICE_CAPACITY),
            bus,
            scope,
            clock,
            mix: vec![0.0; MAX_BLOCK_SIZE],
            left: vec![0.0; MAX_BLOCK_SIZE],
            right: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Render stereo output. `left` and `right` must be the same length.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left
            .chunks_mut(MAX_BLOCK_SIZE)
            .zip(right.chunks_mut(MAX_BLOCK_SIZE))
        {
            self.render_block(l, r);
        }
    }

    /// Render into an interleaved device buffer.
    ///
    /// Channel 0 gets left and channel 1 right; a mono device gets the
    /// downmix and any further channels stay silent.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for frames in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
            let n = frames.len() / channels;
            let mut left = std::mem::take(&mut self.left);
            let mut right = std::mem::take(&mut self.right);
            self.render_block(&mut left[..n], &mut right[..n]);

            for (i, frame) in frames.chunks_exact_mut(channels).enumerate() {
                match frame {
                    [mono] => *mono = 0.5 * (left[i] + right[i]),
                    [l, r, rest @ ..] => {
                        *l = left[i];
                        *r = right[i];
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }
            self.left = left;
            self.right = right;
        }
    }

    fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let n = left.len();
        let now = self.clock.now();
        self.drain_messages(now);

        let ctx = RenderCtx::from_freq(self.clock.sample_rate(), 0.0).at(now);
        let mix = &mut self.mix[..n];
        mix.fill(0.0);
        for voice in &mut self.voices {
            voice.render(mix, &ctx);
        }

        self.bus.process(mix, left, right, &ctx);
        self.scope.write_stereo(left, right);

        self.clock.advance(n);
        self.retire_expired(self.clock.now());
    }

    fn drain_messages(&mut self, now: f64) {
        while let Ok(message) = self.rx.pop() {
            match message {
                EngineMessage::Start(mut voice) => {
                    if let Some(index) = self.voices.iter().position(|v| v.note() == voice.note()) {
                        self.retire(index);
                    }
                    voice.start(now);
                    self.voices.push(voice);
                }
                EngineMessage::Release { note, id, release } => {
                    if let Some(voice) = self
                        .voices
                        .iter_mut()
                        .find(|v| v.id() == id && v.note() == note)
                    {
                        voice.release(now, release);
                    }
                }
                EngineMessage::Bus(params) => self.bus.set_params(params, now),
            }
        }
    }

    fn retire_expired(&mut self, now: f64) {
        let mut index = 0;
        while index < self.voices.len() {
            if self.voices[index].is_expired(now) {
                self.retire(index);
            } else {
                index += 1;
            }
        }
    }

    fn retire(&mut self, index: usize) {
        let mut voice = self.voices.swap_remove(index);
        voice.disconnect();
        // A full graveyard means the control side has stalled; drop here
        let _ = self.graveyard.push(voice);
    }

    /// Voices still connected to the bus.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Nodes owned by connected voices.
    pub fn connected_nodes(&self) -> usize {
        self.voices.iter().map(|v| v.node_count()).sum()
    }

    pub fn notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.voices.iter().map(|v| v.note())
    }

    pub fn clock(&self) -> &RenderClock {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::scope::scope,
        settings::SynthSettings,
        synth::{builder::VoiceBuilder, message::BusParams},
    };
    use rtrb::RingBuffer;
    use std::sync::Arc;

    struct Rig {
        renderer: Renderer,
        tx: Producer<EngineMessage>,
        graveyard: Consumer<Box<Voice>>,
        builder: VoiceBuilder,
    }

    fn rig() -> Rig {
        let settings = SynthSettings::default();
        let (tx, rx) = RingBuffer::new(16);
        let (grave_tx, graveyard) = RingBuffer::new(16);
        let mut rng = fastrand::Rng::with_seed(1);
        let impulse = crate::dsp::impulse::reverb_impulse(1_000.0, 0.5, 4.0, &mut rng);
        let bus = EffectsBus::new(BusParams::from(&settings), impulse, 0.5);
        let (writer, _reader) = scope(64);
        let renderer = Renderer::new(rx, grave_tx, bus, writer, RenderClock::new(1_000.0));
        let noise: Arc<[f32]> = Arc::from(vec![0.1f32; 100]);
        Rig {
            renderer,
            tx,
            graveyard,
            builder: VoiceBuilder::new(noise, true),
        }
    }

    fn start(rig: &mut Rig, note: u8) -> crate::synth::voice::VoiceId {
        let voice = rig.builder.build_voice(note, &SynthSettings::default());
        let id = voice.id();
        rig.tx.push(EngineMessage::Start(Box::new(voice))).unwrap();
        id
    }

    fn render(rig: &mut Rig, frames: usize) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        rig.renderer.render(&mut left, &mut right);
    }

    #[test]
    fn start_replaces_voice_on_same_note() {
        let mut rig = rig();
        start(&mut rig, 60);
        render(&mut rig, 10);
        start(&mut rig, 60);
        start(&mut rig, 64);
        render(&mut rig, 10);

        assert_eq!(rig.renderer.voice_count(), 2);
        let retired = rig.graveyard.pop().unwrap();
        assert_eq!(retired.note(), 60);
        assert_eq!(retired.node_count(), 0);
    }

    #[test]
    fn released_voice_retires_at_deadline() {
        let mut rig = rig();
        let id = start(&mut rig, 60);
        render(&mut rig, 100);

        rig.tx
            .push(EngineMessage::Release { note: 60, id, release: 0.2 })
            .unwrap();
        // Released at 0.1 s: deadline 0.1 + 0.2 + 0.1
        render(&mut rig, 295);
        assert_eq!(rig.renderer.voice_count(), 1);
        render(&mut rig, 10);
        assert_eq!(rig.renderer.voice_count(), 0);
        assert!(rig.graveyard.pop().is_ok());
    }

    #[test]
    fn release_for_stale_id_is_ignored() {
        let mut rig = rig();
        let old = start(&mut rig, 60);
        render(&mut rig, 10);
        start(&mut rig, 60);
        rig.tx
            .push(EngineMessage::Release { note: 60, id: old, release: 0.0 })
            .unwrap();
        render(&mut rig, 500);
        assert_eq!(rig.renderer.voice_count(), 1);
    }

    #[test]
    fn clock_advances_by_frames_rendered() {
        let mut rig = rig();
        render(&mut rig, MAX_BLOCK_SIZE * 2 + 5);
        assert_eq!(rig.renderer.clock().frames(), (MAX_BLOCK_SIZE * 2 + 5) as u64);
    }

    #[test]
    fn interleaved_layouts() {
        let mut rig = rig();
        start(&mut rig, 69);
        let mut stereo = vec![0.0; 2 * 400];
        rig.renderer.render_interleaved(&mut stereo, 2);
        assert!(stereo.iter().any(|&s| s != 0.0));

        let mut quad = vec![1.0; 4 * 100];
        rig.renderer.render_interleaved(&mut quad, 4);
        assert!(quad.chunks(4).all(|f| f[2] == 0.0 && f[3] == 0.0));
    }
}
