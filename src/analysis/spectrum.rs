//! Byte magnitude spectrum with time smoothing.
//!
//! Follows the usual browser analyser pipeline, so visualisers tuned for
//! one look the same on the other:
//!
//! ```text
//! last N samples ──→ × Blackman ──→ FFT ──→ |X[k]| / N
//!     ──→ smoothed[k] = τ·smoothed[k] + (1 − τ)·|X[k]|/N
//!     ──→ dB = 20·log10(smoothed[k])
//!     ──→ byte = ⌊255 · (dB − min_dB) / (max_dB − min_dB)⌋, clamped to 0..=255
//! ```
//!
//! Only the first N/2 bins are reported.

use std::{f32::consts::PI, sync::Arc};

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::settings::EngineConfig;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, smoothing: f32, min_decibels: f32, max_decibels: f32) -> Self {
        let fft_size = fft_size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        Self {
            fft,
            window: blackman(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            smoothing: smoothing.clamp(0.0, 1.0),
            min_decibels,
            max_decibels,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.fft_size,
            config.spectrum_smoothing,
            config.min_decibels,
            config.max_decibels,
        )
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Analyse the newest `fft_size` samples of `samples` and return one
    /// byte per bin. A short input is treated as front-padded with silence.
    pub fn byte_frequency_data(&mut self, samples: &[f32]) -> Vec<u8> {
        self.update(samples);

        let range = self.max_decibels - self.min_decibels;
        let scale = if range > 0.0 { 255.0 / range } else { 0.0 };
        self.smoothed
            .iter()
            .map(|&magnitude| {
                let db = 20.0 * magnitude.log10();
                let scaled = (scale * (db - self.min_decibels)).floor();
                // NaN and -inf (silent bins) both land on 0
                if scaled >= 255.0 {
                    255
                } else if scaled > 0.0 {
                    scaled as u8
                } else {
                    0
                }
            })
            .collect()
    }

    fn update(&mut self, samples: &[f32]) {
        let n = self.window.len();
        let take = samples.len().min(n);
        let pad = n - take;
        let tail = &samples[samples.len() - take..];

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let x = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(x * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let norm = 1.0 / n as f32;
        let tau = self.smoothing;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&self.buffer) {
            let magnitude = bin.norm() * norm;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }
    }
}

fn blackman(n: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn silence_is_all_zero() {
        let mut analyzer = SpectrumAnalyzer::new(256, 0.8, -100.0, -30.0);
        let bytes = analyzer.byte_frequency_data(&[0.0; 256]);
        assert_eq!(bytes.len(), 128);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn tone_peaks_in_its_bin() {
        let sample_rate = 44_100.0;
        let mut analyzer = SpectrumAnalyzer::new(256, 0.0, -100.0, -30.0);
        // Bin 20 of a 256-point FFT
        let freq = 20.0 * sample_rate / 256.0;
        let bytes = analyzer.byte_frequency_data(&sine(freq, sample_rate, 256));

        // A periodic Blackman window leaks into two neighbours on each side only
        assert_eq!(bytes[20], 255, "a full-scale tone saturates the range");
        assert!(bytes[18] > 0 && bytes[22] > 0);
        assert_eq!(bytes[15], 0);
        assert_eq!(bytes[25], 0);
        assert_eq!(bytes[100], 0);
    }

    #[test]
    fn smoothing_lags_behind_input() {
        let sample_rate = 44_100.0;
        let freq = 20.0 * sample_rate / 256.0;
        let tone = sine(freq, sample_rate, 256);

        let mut smoothed = SpectrumAnalyzer::new(256, 0.8, -100.0, -30.0);
        let mut instant = SpectrumAnalyzer::new(256, 0.0, -100.0, -30.0);
        let first = smoothed.byte_frequency_data(&tone);
        let reference = instant.byte_frequency_data(&tone);
        assert!(first[20] <= reference[20]);

        // Tone stops; the smoothed bin decays instead of vanishing
        let after = smoothed.byte_frequency_data(&[0.0; 256]);
        assert!(after[20] > 0);
        assert_eq!(instant.byte_frequency_data(&[0.0; 256])[20], 0);
    }

    #[test]
    fn uses_the_newest_samples() {
        let mut analyzer = SpectrumAnalyzer::new(64, 0.0, -100.0, -30.0);
        let mut samples = sine(5_000.0, 44_100.0, 64);
        samples.extend(std::iter::repeat(0.0).take(64));
        let bytes = analyzer.byte_frequency_data(&samples);
        assert!(bytes.iter().all(|&b| b == 0));
        assert_eq!(analyzer.frequency_bin_count(), 32);
    }
}
