//! Low-level DSP primitives used by the higher level graph nodes.
//!
//! Everything here is allocation-free once constructed and safe to run on
//! the audio thread. Graph nodes and the effects bus layer note events and
//! routing on top.

/// Scheduled parameter changes (set, linear ramp, exponential approach).
pub mod automation;
/// Uniformly partitioned FFT convolution for the reverb.
pub mod convolution;
/// Attack/decay/sustain/release envelope on an automation lane.
pub mod envelope;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Impulse responses and noise bursts generated at startup.
pub mod impulse;
/// Oscillator waveforms.
pub mod oscillator;
