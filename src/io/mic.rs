//! Microphone input.
//!
//! An [`InputSource`] opens a stream whose callback keeps only the newest
//! samples in a fixed window, overwriting the oldest. A [`MicSession`] owns
//! that stream and runs the pitch detector over the window on demand, so a
//! slow poll always sees the latest audio. Dropping the session closes the
//! stream.

use std::sync::{Arc, Mutex};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Sample,
};
use tracing::{debug, warn};

use crate::{
    analysis::scope::{scope, ScopeReader, ScopeWriter},
    error::{EngineError, Result},
    pitch::{PitchDetector, PitchSample},
};

pub trait InputSource {
    /// Open the input, keeping the newest `window` samples.
    fn open(&mut self, window: usize) -> Result<MicStream>;
}

/// An open input: its rate, its sample window and whatever keeps it alive.
pub struct MicStream {
    sample_rate: f32,
    samples: ScopeReader,
    _stream: Option<cpal::Stream>,
}

impl MicStream {
    pub fn new(sample_rate: f32, samples: ScopeReader) -> Self {
        Self {
            sample_rate,
            samples,
            _stream: None,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// Default system input through cpal.
#[derive(Default)]
pub struct CpalInput;

impl CpalInput {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for CpalInput {
    fn open(&mut self, window: usize) -> Result<MicStream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(EngineError::NoInputDevice)?;
        let config = device
            .default_input_config()
            .map_err(|e| EngineError::PermissionDenied(e.to_string()))?;
        let sample_rate = config.sample_rate().0 as f32;
        let stream_config = config.config();

        let (writer, reader) = scope(window);
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_input::<f32>(&device, &stream_config, writer)?,
            cpal::SampleFormat::I16 => build_input::<i16>(&device, &stream_config, writer)?,
            cpal::SampleFormat::U16 => build_input::<u16>(&device, &stream_config, writer)?,
            format => {
                return Err(EngineError::DeviceConfig(format!(
                    "unsupported input sample format: {format:?}"
                )))
            }
        };
        stream
            .play()
            .map_err(|e| EngineError::PlayStream(e.to_string()))?;

        debug!(sample_rate, channels = stream_config.channels, "opened input device");
        Ok(MicStream {
            sample_rate,
            samples: reader,
            _stream: Some(stream),
        })
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut writer: ScopeWriter,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                writer.write(data.chunks(channels).map(|frame| {
                    let sum: f32 = frame.iter().map(|&s| s.to_sample::<f32>()).sum();
                    sum / frame.len() as f32
                }));
            },
            |err| warn!(%err, "input stream error"),
            None,
        )
        .map_err(|e| EngineError::BuildStream(e.to_string()))
}

/// Input fed by hand. Tests push samples through the paired [`FeedHandle`].
pub struct FeedInput {
    sample_rate: f32,
    denied: bool,
    slot: Arc<Mutex<Option<ScopeWriter>>>,
}

#[derive(Clone)]
pub struct FeedHandle {
    slot: Arc<Mutex<Option<ScopeWriter>>>,
}

impl FeedInput {
    pub fn new(sample_rate: f32) -> (Self, FeedHandle) {
        let slot = Arc::new(Mutex::new(None));
        (
            Self {
                sample_rate,
                denied: false,
                slot: slot.clone(),
            },
            FeedHandle { slot },
        )
    }

    /// An input that always refuses to open, like a denied permission prompt.
    pub fn denied(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            denied: true,
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

impl InputSource for FeedInput {
    fn open(&mut self, window: usize) -> Result<MicStream> {
        if self.denied {
            return Err(EngineError::PermissionDenied("input refused".into()));
        }
        let (writer, reader) = scope(window);
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(writer);
        Ok(MicStream::new(self.sample_rate, reader))
    }
}

impl FeedHandle {
    /// Push samples to the open session. Returns how many were written,
    /// zero once the session is closed.
    pub fn push(&self, samples: &[f32]) -> usize {
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(writer) = slot.as_mut().filter(|w| !w.is_abandoned()) else {
            return 0;
        };
        writer.write(samples.iter().copied());
        samples.len()
    }

    /// True while a session is reading from this feed.
    pub fn is_open(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|w| !w.is_abandoned())
    }
}

/// The one open microphone session.
pub struct MicSession {
    stream: MicStream,
    window_len: usize,
    detector: PitchDetector,
}

impl MicSession {
    pub fn new(stream: MicStream, window_len: usize) -> Self {
        Self {
            stream,
            window_len: window_len.max(1),
            detector: PitchDetector::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.stream.sample_rate
    }

    /// The newest `window_len` input samples, oldest first.
    pub fn window(&self) -> Vec<f32> {
        self.stream.samples.snapshot(self.window_len)
    }

    /// Detect the pitch of the newest window of input.
    pub fn detect(&mut self) -> Option<PitchSample> {
        let window = self.window();
        self.detector.detect(&window, self.stream.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.7 * (TAU * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn session_detects_fed_tone() {
        let (mut input, feed) = FeedInput::new(44_100.0);
        let mut session = MicSession::new(input.open(8_192).unwrap(), 2_048);

        assert_eq!(session.detect(), None, "window starts silent");
        assert_eq!(feed.push(&sine(440.0, 44_100.0, 4_096)), 4_096);
        let pitch = session.detect().expect("tone should be detected");
        assert_eq!(pitch.midi_note, 69);
    }

    #[test]
    fn window_keeps_newest_samples() {
        let (mut input, feed) = FeedInput::new(1_000.0);
        let session = MicSession::new(input.open(4).unwrap(), 4);
        assert_eq!(feed.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), 6);
        assert_eq!(session.window(), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn late_poll_hears_the_newest_tone() {
        let (mut input, feed) = FeedInput::new(44_100.0);
        let mut session = MicSession::new(input.open(2_048).unwrap(), 2_048);

        // Far more than one window of A4 goes unread before E5 arrives
        feed.push(&sine(440.0, 44_100.0, 44_100));
        feed.push(&sine(659.26, 44_100.0, 4_096));
        let pitch = session.detect().expect("tone should be detected");
        assert_eq!(pitch.midi_note, 76);
    }

    #[test]
    fn feed_closes_with_session() {
        let (mut input, feed) = FeedInput::new(44_100.0);
        assert!(!feed.is_open());
        let session = MicSession::new(input.open(16).unwrap(), 16);
        assert!(feed.is_open());
        drop(session);
        assert!(!feed.is_open());
        assert_eq!(feed.push(&[0.5]), 0);
    }

    #[test]
    fn denied_input_fails_to_open() {
        let mut input = FeedInput::denied(44_100.0);
        assert!(matches!(input.open(16), Err(EngineError::PermissionDenied(_))));
    }
}
