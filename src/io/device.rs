//! Audio output devices.
//!
//! The engine never talks to a sound card directly. It hands a [`Renderer`]
//! to an [`AudioDevice`], which decides who calls it and when:
//!
//! - [`CpalOutput`] runs it from the system audio callback.
//! - [`OfflineOutput`] parks it behind a handle so tests and tools can pull
//!   frames on demand, with no hardware and fully deterministic timing.

use std::sync::{Arc, Mutex, MutexGuard};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info, warn};

use crate::{
    engine::renderer::Renderer,
    error::{EngineError, Result},
};

pub trait AudioDevice {
    /// Open the device and return the sample rate it will run at.
    ///
    /// `preferred_rate` is a hint; devices that cannot honour it pick their
    /// own rate. Called again after a failed start.
    fn open(&mut self, preferred_rate: u32) -> Result<f32>;

    /// Begin pulling audio from `renderer`.
    fn start(&mut self, renderer: Renderer) -> Result<()>;

    /// Resume a device the platform suspended.
    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        false
    }
}

/// Default system output through cpal.
#[derive(Default)]
pub struct CpalOutput {
    device: Option<cpal::Device>,
    config: Option<cpal::SupportedStreamConfig>,
    stream: Option<cpal::Stream>,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioDevice for CpalOutput {
    fn open(&mut self, preferred_rate: u32) -> Result<f32> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        let config = pick_config(&device, preferred_rate)?;
        let sample_rate = config.sample_rate().0 as f32;

        if let Ok(name) = device.name() {
            debug!(device = %name, sample_rate, channels = config.channels(), "opened output device");
        }
        self.device = Some(device);
        self.config = Some(config);
        Ok(sample_rate)
    }

    fn start(&mut self, renderer: Renderer) -> Result<()> {
        let (Some(device), Some(config)) = (&self.device, &self.config) else {
            return Err(EngineError::Unavailable);
        };

        let stream_config: cpal::StreamConfig = config.config();
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(device, &stream_config, renderer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(device, &stream_config, renderer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(device, &stream_config, renderer)?,
            format => {
                return Err(EngineError::DeviceConfig(format!(
                    "unsupported sample format: {format:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| EngineError::PlayStream(e.to_string()))?;
        info!(sample_rate = stream_config.sample_rate.0, "output stream started");
        self.stream = Some(stream);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| EngineError::PlayStream(e.to_string()))?;
        }
        Ok(())
    }
}

/// Default config, moved to `preferred_rate` when the device supports it.
fn pick_config(device: &cpal::Device, preferred_rate: u32) -> Result<cpal::SupportedStreamConfig> {
    let default = device
        .default_output_config()
        .map_err(|e| EngineError::DeviceConfig(e.to_string()))?;
    if default.sample_rate().0 == preferred_rate {
        return Ok(default);
    }

    let preferred = cpal::SampleRate(preferred_rate);
    let matching = device
        .supported_output_configs()
        .map_err(|e| EngineError::DeviceConfig(e.to_string()))?
        .filter(|range| {
            range.sample_format() == default.sample_format()
                && range.channels() == default.channels()
                && range.min_sample_rate() <= preferred
                && preferred <= range.max_sample_rate()
        })
        .map(|range| range.with_sample_rate(preferred))
        .next();

    Ok(matching.unwrap_or(default))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: Renderer,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    // Grows on the first callback, then stays put
    let mut scratch = Vec::<f32>::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let block = &mut scratch[..data.len()];
                renderer.render_interleaved(block, channels);
                for (out, &sample) in data.iter_mut().zip(block.iter()) {
                    *out = T::from_sample(sample);
                }
            },
            |err| warn!(%err, "output stream error"),
            None,
        )
        .map_err(|e| EngineError::BuildStream(e.to_string()))
}

/// Output with no hardware behind it. Audio is produced only when the
/// paired [`OfflineHandle`] asks for it.
pub struct OfflineOutput {
    sample_rate: f32,
    slot: Arc<Mutex<Option<Renderer>>>,
}

/// Pulls audio from an engine running on an [`OfflineOutput`].
#[derive(Clone)]
pub struct OfflineHandle {
    slot: Arc<Mutex<Option<Renderer>>>,
}

impl OfflineOutput {
    pub fn new(sample_rate: f32) -> (Self, OfflineHandle) {
        let slot = Arc::new(Mutex::new(None));
        (
            Self {
                sample_rate,
                slot: slot.clone(),
            },
            OfflineHandle { slot },
        )
    }
}

impl AudioDevice for OfflineOutput {
    fn open(&mut self, _preferred_rate: u32) -> Result<f32> {
        Ok(self.sample_rate)
    }

    fn start(&mut self, renderer: Renderer) -> Result<()> {
        *lock(&self.slot) = Some(renderer);
        Ok(())
    }
}

impl OfflineHandle {
    /// Render `frames` of stereo output. Silent if the engine has not
    /// started yet.
    pub fn render(&self, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        self.render_into(&mut left, &mut right);
        (left, right)
    }

    /// Render into caller buffers. Returns false if nothing is attached.
    pub fn render_into(&self, left: &mut [f32], right: &mut [f32]) -> bool {
        match lock(&self.slot).as_mut() {
            Some(renderer) => {
                renderer.render(left, right);
                true
            }
            None => false,
        }
    }

    pub fn is_started(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Voices currently connected to the bus.
    pub fn live_voices(&self) -> usize {
        lock(&self.slot).as_ref().map_or(0, |r| r.voice_count())
    }

    /// Graph nodes owned by connected voices.
    pub fn connected_nodes(&self) -> usize {
        lock(&self.slot).as_ref().map_or(0, |r| r.connected_nodes())
    }

    /// Notes of the connected voices, ascending.
    pub fn live_notes(&self) -> Vec<u8> {
        let mut notes: Vec<u8> = lock(&self.slot)
            .as_ref()
            .map(|r| r.notes().collect())
            .unwrap_or_default();
        notes.sort_unstable();
        notes
    }
}

fn lock(slot: &Mutex<Option<Renderer>>) -> MutexGuard<'_, Option<Renderer>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
