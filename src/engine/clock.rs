use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Frames rendered so far, shared between the render and control threads.
///
/// The render thread is the only writer. Everything that schedules audio
/// (envelopes, bus glides, teardown deadlines) uses [`RenderClock::now`] as
/// its time base, so timing follows the audio actually produced rather than
/// the wall clock.
#[derive(Debug, Clone)]
pub struct RenderClock {
    frames: Arc<AtomicU64>,
    sample_rate: f32,
}

impl RenderClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Current render time in seconds.
    pub fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub(crate) fn advance(&self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_count() {
        let clock = RenderClock::new(1_000.0);
        let observer = clock.clone();
        clock.advance(250);
        clock.advance(250);
        assert_eq!(observer.frames(), 500);
        assert!((observer.now() - 0.5).abs() < 1e-12);
    }
}
