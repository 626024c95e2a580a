//! keyvox: a polyphonic keyboard synthesizer with a live spectrum and a
//! microphone tuner.
//!
//! The crate is layered bottom-up:
//!
//! - [`dsp`]: realtime-safe primitives (oscillators, envelopes, filters,
//!   automation lanes, convolution).
//! - [`graph`]: composable nodes built on those primitives.
//! - [`synth`]: per-note voices assembled from graph nodes.
//! - [`engine`]: the control surface, the render thread and the effects bus.
//! - [`analysis`] and [`pitch`]: spectrum of the output and pitch of the
//!   microphone.
//! - [`io`]: audio devices on both ends.

pub mod analysis;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod io;
pub mod pitch;
pub mod settings;
pub mod synth; // Voice construction and lifecycle

pub const MAX_BLOCK_SIZE: usize = 2048;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use pitch::PitchSample;
pub use settings::{EngineConfig, OscType, Preset, SettingsPatch, SynthSettings};
