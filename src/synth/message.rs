use crate::{
    settings::SynthSettings,
    synth::voice::{Voice, VoiceId},
};

/// Commands sent from the control thread to the render thread.
pub enum EngineMessage {
    /// Start a freshly built voice, replacing any voice on the same note.
    Start(Box<Voice>),
    /// Release the voice with `id` over `release` seconds.
    Release { note: u8, id: VoiceId, release: f32 },
    /// Glide the shared bus towards new parameters.
    Bus(BusParams),
}

/// Live parameters of the shared effects bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusParams {
    pub cutoff: f32,
    pub resonance: f32,
    pub reverb: f32,
}

impl From<&SynthSettings> for BusParams {
    fn from(settings: &SynthSettings) -> Self {
        Self {
            cutoff: settings.cutoff,
            resonance: settings.resonance,
            reverb: settings.reverb,
        }
    }
}

impl std::fmt::Debug for EngineMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineMessage::Start(voice) => f
                .debug_struct("Start")
                .field("note", &voice.note())
                .field("id", &voice.id())
                .finish(),
            EngineMessage::Release { note, id, release } => f
                .debug_struct("Release")
                .field("note", note)
                .field("id", id)
                .field("release", release)
                .finish(),
            EngineMessage::Bus(params) => f.debug_tuple("Bus").field(params).finish(),
        }
    }
}
