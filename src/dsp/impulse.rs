//! Synthetic impulse responses and noise buffers.
//!
//! The reverb tail is shaped white noise rather than a recorded room:
//!
//! ```text
//! h[j] = u_j * (1 - j / len)^decay      u_j uniform in [-1, 1)
//! ```
//!
//! With `decay = 4` the envelope falls off fast at first and reaches exactly
//! zero on the last sample, so the tail never ends in a click. Each channel
//! draws independent noise, which decorrelates left and right and gives the
//! reverb its width.

/// Number of frames covering `seconds` at `sample_rate`, at least one.
pub fn frames_for(sample_rate: f32, seconds: f32) -> usize {
    ((sample_rate * seconds.max(0.0)) as usize).max(1)
}

/// Stereo decaying-noise impulse response.
pub fn reverb_impulse(
    sample_rate: f32,
    seconds: f32,
    decay: f32,
    rng: &mut fastrand::Rng,
) -> [Vec<f32>; 2] {
    let len = frames_for(sample_rate, seconds);
    let channel = |rng: &mut fastrand::Rng| -> Vec<f32> {
        (0..len)
            .map(|j| {
                let envelope = (1.0 - j as f32 / len as f32).powf(decay);
                (rng.f32() * 2.0 - 1.0) * envelope
            })
            .collect()
    };
    let left = channel(rng);
    let right = channel(rng);
    [left, right]
}

/// Mono white noise in [-1, 1).
pub fn noise_burst(sample_rate: f32, seconds: f32, rng: &mut fastrand::Rng) -> Vec<f32> {
    (0..frames_for(sample_rate, seconds))
        .map(|_| rng.f32() * 2.0 - 1.0)
        .collect()
}
