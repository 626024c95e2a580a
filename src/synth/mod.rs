// Purpose: Per-note voices and the graphs that make them sound
// This layer sits above graph nodes and below the engine

pub mod builder;
pub mod message;
pub mod voice;

pub use builder::VoiceBuilder;
pub use message::{BusParams, EngineMessage};
pub use voice::{Voice, VoiceId, VoiceState, TEARDOWN_MARGIN};
