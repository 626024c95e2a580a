//! Composable building blocks for constructing audio-processing graphs.
//!
//! Graph nodes wrap the low-level DSP primitives with what a voice needs:
//! note-on events, modulation and block-based rendering. The `extensions`
//! module adds fluent helpers so voices can be assembled with a chainable
//! API.

/// Fluent combinators (`.gain()`, `.through()`, `.sum()`).
pub mod extensions;
/// Topology-preserving filter node.
pub mod filter;
/// Parallel band-pass resonators for vowel colour.
pub mod formant;
/// Constant or automated amplitude.
pub mod gain;
/// Low frequency oscillators for parameter modulation.
pub mod lfo;
/// Summing bus for parallel layers.
pub mod mix;
/// Core traits shared by all graph nodes.
pub mod node;
/// One-shot playback of a pre-rendered noise buffer.
pub mod noise;
/// Audio-band oscillators.
pub mod oscillator;
/// Serial chaining of two nodes (source into effect).
pub mod through;
