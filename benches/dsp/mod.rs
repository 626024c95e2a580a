//! Benchmarks for low-level DSP primitives.

mod convolution;
mod envelope;
mod filter;
mod oscillator;
mod pitch;

pub use convolution::bench_convolution;
pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use oscillator::bench_oscillator;
pub use pitch::bench_pitch;
