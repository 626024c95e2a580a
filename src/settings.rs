//! Synth settings, partial updates, presets and engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::OscillatorWaveform;

/// Timbre selector shared by every voice.
///
/// The four classic shapes pick the primary layer's waveform. `Vocal` swaps
/// the whole voice graph for a vibrato sawtooth through three formant bands.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscType {
    Sine,
    Square,
    Sawtooth,
    #[default]
    Triangle,
    Vocal,
}

impl OscType {
    /// Waveform for the primary layer, `None` for the formant voice.
    pub fn waveform(self) -> Option<OscillatorWaveform> {
        match self {
            OscType::Sine => Some(OscillatorWaveform::Sine),
            OscType::Square => Some(OscillatorWaveform::Square),
            OscType::Sawtooth => Some(OscillatorWaveform::Saw),
            OscType::Triangle => Some(OscillatorWaveform::Triangle),
            OscType::Vocal => None,
        }
    }
}

/// Process-wide synth parameters.
///
/// Values are applied as given; nothing here is clamped. The DSP layers guard
/// against the handful of values that would produce NaNs (zero Q, cutoff
/// above Nyquist).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthSettings {
    pub osc_type: OscType,
    /// Seconds from note-on to the envelope peak.
    pub attack: f32,
    /// Seconds from the peak to the sustain level.
    pub decay: f32,
    /// Sustain level, 0..1.
    pub sustain: f32,
    /// Seconds from note-off to near-silence.
    pub release: f32,
    /// Shared lowpass cutoff in Hz.
    pub cutoff: f32,
    /// Shared lowpass Q.
    pub resonance: f32,
    /// Reverb send level, 0..1.
    pub reverb: f32,
    /// Detune of the primary layer in cents.
    pub detune: f32,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            osc_type: OscType::Triangle,
            attack: 0.002,
            decay: 1.5,
            sustain: 0.02,
            release: 0.5,
            cutoff: 2800.0,
            resonance: 0.5,
            reverb: 0.4,
            detune: 0.0,
        }
    }
}

impl SynthSettings {
    /// Overwrite only the fields present in `patch`.
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(osc_type) = patch.osc_type {
            self.osc_type = osc_type;
        }
        if let Some(attack) = patch.attack {
            self.attack = attack;
        }
        if let Some(decay) = patch.decay {
            self.decay = decay;
        }
        if let Some(sustain) = patch.sustain {
            self.sustain = sustain;
        }
        if let Some(release) = patch.release {
            self.release = release;
        }
        if let Some(cutoff) = patch.cutoff {
            self.cutoff = cutoff;
        }
        if let Some(resonance) = patch.resonance {
            self.resonance = resonance;
        }
        if let Some(reverb) = patch.reverb {
            self.reverb = reverb;
        }
        if let Some(detune) = patch.detune {
            self.detune = detune;
        }
    }

    pub fn merged(mut self, patch: &SettingsPatch) -> Self {
        self.merge(patch);
        self
    }
}

/// Partial settings update. `None` leaves the current value in place.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SettingsPatch {
    pub osc_type: Option<OscType>,
    pub attack: Option<f32>,
    pub decay: Option<f32>,
    pub sustain: Option<f32>,
    pub release: Option<f32>,
    pub cutoff: Option<f32>,
    pub resonance: Option<f32>,
    pub reverb: Option<f32>,
    pub detune: Option<f32>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn osc_type(mut self, osc_type: OscType) -> Self {
        self.osc_type = Some(osc_type);
        self
    }

    pub fn attack(mut self, seconds: f32) -> Self {
        self.attack = Some(seconds);
        self
    }

    pub fn decay(mut self, seconds: f32) -> Self {
        self.decay = Some(seconds);
        self
    }

    pub fn sustain(mut self, level: f32) -> Self {
        self.sustain = Some(level);
        self
    }

    pub fn release(mut self, seconds: f32) -> Self {
        self.release = Some(seconds);
        self
    }

    pub fn cutoff(mut self, hz: f32) -> Self {
        self.cutoff = Some(hz);
        self
    }

    pub fn resonance(mut self, q: f32) -> Self {
        self.resonance = Some(q);
        self
    }

    pub fn reverb(mut self, level: f32) -> Self {
        self.reverb = Some(level);
        self
    }

    pub fn detune(mut self, cents: f32) -> Self {
        self.detune = Some(cents);
        self
    }

    /// True when the patch touches a parameter of the shared effects bus.
    pub fn touches_bus(&self) -> bool {
        self.cutoff.is_some() || self.resonance.is_some() || self.reverb.is_some()
    }
}

/// Built-in sounds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Piano,
    Synth,
    Space,
    Bass,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Piano, Preset::Synth, Preset::Space, Preset::Bass];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Piano => "Piano",
            Preset::Synth => "Synth",
            Preset::Space => "Space",
            Preset::Bass => "Bass",
        }
    }

    /// Full patch for this preset. Detune is left untouched.
    pub fn patch(self) -> SettingsPatch {
        let (osc, a, d, s, r, cutoff, q, reverb) = match self {
            Preset::Piano => (OscType::Triangle, 0.002, 1.8, 0.01, 0.35, 2800.0, 0.5, 0.4),
            Preset::Synth => (OscType::Sawtooth, 0.05, 0.2, 0.4, 0.8, 2000.0, 4.0, 0.3),
            Preset::Space => (OscType::Sine, 0.8, 1.5, 0.6, 2.0, 1200.0, 1.0, 0.8),
            Preset::Bass => (OscType::Square, 0.01, 0.4, 0.0, 0.1, 600.0, 8.0, 0.1),
        };
        SettingsPatch::new()
            .osc_type(osc)
            .attack(a)
            .decay(d)
            .sustain(s)
            .release(r)
            .cutoff(cutoff)
            .resonance(q)
            .reverb(reverb)
    }
}

/// Engine construction parameters. Fixed for the lifetime of an engine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Preferred output sample rate. The device may pick another.
    pub sample_rate: u32,
    pub master_gain: f32,
    /// Length of the generated reverb impulse response.
    pub reverb_seconds: f32,
    /// Exponent of the impulse response's decay curve.
    pub reverb_decay: f32,
    /// Length of the hammer noise buffer.
    pub noise_seconds: f32,
    /// Window of the shared output analyser. Yields `fft_size / 2` bins.
    pub fft_size: usize,
    pub spectrum_smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    /// Samples of microphone history handed to the pitch detector.
    pub mic_window: usize,
    /// Capacity of the control-to-render message ring.
    pub queue_capacity: usize,
    /// Add a quiet 3x sine partial to the default timbre.
    pub third_partial: bool,
    /// Seed for noise and impulse generation. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            master_gain: 0.5,
            reverb_seconds: 2.5,
            reverb_decay: 4.0,
            noise_seconds: 0.1,
            fft_size: 256,
            spectrum_smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            mic_window: 2048,
            queue_capacity: 256,
            third_partial: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_reverb(mut self, seconds: f32, decay: f32) -> Self {
        self.reverb_seconds = seconds;
        self.reverb_decay = decay;
        self
    }

    pub fn with_fft_size(mut self, fft_size: usize) -> Self {
        self.fft_size = fft_size;
        self
    }

    pub fn with_mic_window(mut self, samples: usize) -> Self {
        self.mic_window = samples;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_third_partial(mut self, enabled: bool) -> Self {
        self.third_partial = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_touches_present_fields() {
        let mut settings = SynthSettings::default();
        settings.merge(&SettingsPatch::new().reverb(0.9));

        assert_eq!(settings.reverb, 0.9);
        assert_eq!(settings, SynthSettings { reverb: 0.9, ..SynthSettings::default() });
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let before = SynthSettings::default();
        let after = before.merged(&SettingsPatch::new());
        assert_eq!(before, after);
    }

    #[test]
    fn out_of_range_values_are_kept_as_given() {
        let settings = SynthSettings::default().merged(&SettingsPatch::new().sustain(1.5).reverb(-1.0));
        assert_eq!(settings.sustain, 1.5);
        assert_eq!(settings.reverb, -1.0);
    }

    #[test]
    fn presets_cover_every_voice_parameter_but_detune() {
        for preset in Preset::ALL {
            let patch = preset.patch();
            assert!(patch.osc_type.is_some(), "{} missing osc", preset.name());
            assert!(patch.release.is_some(), "{} missing release", preset.name());
            assert!(patch.touches_bus());
            assert!(patch.detune.is_none());
        }
    }

    #[test]
    fn vocal_has_no_plain_waveform() {
        assert!(OscType::Vocal.waveform().is_none());
        assert!(matches!(
            OscType::Triangle.waveform(),
            Some(OscillatorWaveform::Triangle)
        ));
    }
}
