//! Fundamental-frequency estimation by autocorrelation.
//!
//! ```text
//!   buffer ──→ RMS gate ──→ trim edges ──→ c[lag] = Σ x[j]·x[j+lag]
//!                                              │
//!        skip the lag-0 descent, take the highest peak T0
//!                                              │
//!        parabolic vertex through c[T0-1], c[T0], c[T0+1]
//!                                              │
//!        f = sr / T0  ──→  midi = 69 + 12·log2(f / 440)
//! ```
//!
//! The gate and trim thresholds are absolute sample amplitudes, so the
//! detector expects input roughly normalised to ±1.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RMS below which a buffer is treated as silence.
pub const SILENCE_RMS: f32 = 0.01;
/// Amplitude the edge trim looks for.
pub const TRIM_THRESHOLD: f32 = 0.2;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One pitch estimate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchSample {
    pub frequency_hz: f32,
    /// Nearest equal-tempered MIDI note.
    pub midi_note: i32,
    /// Distance from `midi_note` in cents, floored.
    pub cents_deviation: i32,
}

impl PitchSample {
    pub fn from_frequency(frequency_hz: f32) -> Self {
        let midi = frequency_to_midi(frequency_hz);
        let note = midi.round();
        Self {
            frequency_hz,
            midi_note: note as i32,
            cents_deviation: (100.0 * (midi - note)).floor() as i32,
        }
    }

    /// Sharp-based note name with octave, e.g. "A4" or "C#3".
    pub fn note_name(&self) -> String {
        note_name(self.midi_note)
    }
}

/// Reusable detector. Holds the correlation buffer between calls.
#[derive(Debug, Default)]
pub struct PitchDetector {
    correlation: Vec<f32>,
}

impl PitchDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate the pitch of `buffer`, or `None` for silence or input with
    /// no usable period.
    pub fn detect(&mut self, buffer: &[f32], sample_rate: f32) -> Option<PitchSample> {
        let period = self.period(buffer)?;
        let frequency_hz = sample_rate / period;
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return None;
        }
        Some(PitchSample::from_frequency(frequency_hz))
    }

    /// Refined period in samples.
    fn period(&mut self, buffer: &[f32]) -> Option<f32> {
        if buffer.is_empty() || rms(buffer) < SILENCE_RMS {
            return None;
        }

        let trimmed = trim(buffer);
        let lags = trimmed.len() / 2;
        if lags < 3 {
            return None;
        }

        self.correlation.clear();
        self.correlation.extend((0..lags).map(|lag| {
            trimmed[..trimmed.len() - lag]
                .iter()
                .zip(&trimmed[lag..])
                .map(|(a, b)| a * b)
                .sum::<f32>()
        }));
        let c = &self.correlation;

        let mut start = 0;
        while start + 1 < c.len() && c[start] > c[start + 1] {
            start += 1;
        }
        if start + 1 >= c.len() {
            // Correlation never turned back up: no period in range
            return None;
        }

        let mut best: Option<usize> = None;
        for lag in start..c.len() {
            if best.map_or(true, |b| c[lag] > c[b]) {
                best = Some(lag);
            }
        }
        let t0 = best.filter(|&lag| lag > 0)?;

        let mut period = t0 as f32;
        if t0 + 1 < c.len() {
            let (x1, x2, x3) = (c[t0 - 1], c[t0], c[t0 + 1]);
            let a = (x1 + x3 - 2.0 * x2) / 2.0;
            let b = (x3 - x1) / 2.0;
            if a != 0.0 {
                period -= b / (2.0 * a);
            }
        }
        (period > 0.0).then_some(period)
    }
}

/// One-shot detection with a throwaway buffer.
pub fn detect_pitch(buffer: &[f32], sample_rate: f32) -> Option<PitchSample> {
    PitchDetector::new().detect(buffer, sample_rate)
}

/// Fractional MIDI note for a frequency. A4 = 440 Hz = 69.
pub fn frequency_to_midi(frequency_hz: f32) -> f32 {
    69.0 + 12.0 * (frequency_hz / 440.0).log2()
}

/// Frequency of a (possibly fractional) MIDI note.
pub fn midi_to_frequency(midi: f32) -> f32 {
    440.0 * 2.0_f32.powf((midi - 69.0) / 12.0)
}

/// Signed cents from `target_hz` to `frequency_hz`, unrounded.
///
/// Unlike [`PitchSample::cents_deviation`] this measures against an
/// arbitrary reference and is not floored, so the two agree only to within
/// one cent when the target is the nearest note.
pub fn cents_from_target(frequency_hz: f32, target_hz: f32) -> f32 {
    1200.0 * (frequency_hz / target_hz).log2()
}

pub fn note_name(midi_note: i32) -> String {
    let class = midi_note.rem_euclid(12) as usize;
    let octave = midi_note.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[class], octave)
}

fn rms(buffer: &[f32]) -> f32 {
    let energy: f32 = buffer.iter().map(|x| x * x).sum();
    (energy / buffer.len() as f32).sqrt()
}

/// Cut the edges back to the first quiet sample from each end.
fn trim(buffer: &[f32]) -> &[f32] {
    let len = buffer.len();
    let half = len / 2;
    let start = (0..half)
        .find(|&i| buffer[i].abs() < TRIM_THRESHOLD)
        .unwrap_or(0);
    let end = (1..half)
        .find(|&i| buffer[len - i].abs() < TRIM_THRESHOLD)
        .map_or(len - 1, |i| len - i);
    &buffer[start..end.max(start)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.8 * (TAU * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn silence_has_no_pitch() {
        assert_eq!(detect_pitch(&[0.0; 2048], 44_100.0), None);
        assert_eq!(detect_pitch(&[0.005; 2048], 44_100.0), None);
        assert_eq!(detect_pitch(&[], 44_100.0), None);
    }

    #[test]
    fn a440_is_a4() {
        let sample = detect_pitch(&sine(440.0, 44_100.0, 2048), 44_100.0)
            .expect("a 440 Hz sine should be detected");
        assert!(
            (sample.frequency_hz - 440.0).abs() < 4.4,
            "got {} Hz",
            sample.frequency_hz
        );
        assert_eq!(sample.midi_note, 69);
        assert!(sample.cents_deviation.abs() <= 5, "{} cents", sample.cents_deviation);
        assert_eq!(sample.note_name(), "A4");
    }

    #[test]
    fn detector_is_reusable() {
        let mut detector = PitchDetector::new();
        let a = detector.detect(&sine(220.0, 44_100.0, 2048), 44_100.0);
        let b = detector.detect(&sine(330.0, 44_100.0, 2048), 44_100.0);
        assert_eq!(a.map(|s| s.midi_note), Some(57));
        assert_eq!(b.map(|s| s.midi_note), Some(64));
    }

    #[test]
    fn dc_offset_has_no_period() {
        // Loud but flat: correlation only falls with lag, no peak to find
        assert_eq!(detect_pitch(&[0.5; 1024], 44_100.0), None);
    }

    #[test]
    fn midi_conversions() {
        assert!((frequency_to_midi(440.0) - 69.0).abs() < 1e-5);
        assert!((midi_to_frequency(60.0) - 261.6256).abs() < 1e-3);
        assert!((frequency_to_midi(midi_to_frequency(42.5)) - 42.5).abs() < 1e-4);
    }

    #[test]
    fn floors_cents_towards_negative() {
        // Ten cents flat of A4
        let sample = PitchSample::from_frequency(midi_to_frequency(68.9));
        assert_eq!(sample.midi_note, 69);
        assert!(matches!(sample.cents_deviation, -11 | -10), "{}", sample.cents_deviation);
    }

    #[test]
    fn target_cents_are_unfloored() {
        assert!((cents_from_target(880.0, 440.0) - 1200.0).abs() < 1e-3);
        let f = midi_to_frequency(69.25);
        assert!((cents_from_target(f, 440.0) - 25.0).abs() < 1e-2);
        let floored = PitchSample::from_frequency(f).cents_deviation;
        assert!((24..=25).contains(&floored), "{floored}");
    }

    #[test]
    fn note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(21), "A0");
        assert_eq!(note_name(0), "C-1");
    }
}
