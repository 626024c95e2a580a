//! Real-world scenario benchmarks.
//!
//! Complete voices as the builder makes them, and chords rendered through
//! the engine's offline output.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
