//! Zero-latency uniformly partitioned FFT convolution.
//!
//! A 2.5 s impulse response at 44.1 kHz is 110k taps. Convolving that
//! directly costs 110k multiply-adds per output sample; chopping the kernel
//! into blocks and convolving in the frequency domain brings it down to a
//! few hundred.
//!
//! # Layout
//!
//! ```text
//! kernel  ──split──→ [h0] [h1][h2]...[hP]
//!                     │    └─ each B taps, zero-padded to 2B, FFT'd once
//!                     └─ B taps, applied directly per sample
//!
//! input   ──B at a time──→ [prev B | new B] ──FFT──→ X0
//!
//!   frequency delay line:  X0  X1 ... XP-1   (X1 is the previous block's spectrum, ...)
//!
//!   tail = Σ Xp · Hp+1   ──IFFT──→ keep the last B samples (overlap-save)
//!
//! output[n] = (h0 * x)[n] + tail[n]
//! ```
//!
//! The frequency-domain path lags its input by one block, which is exactly
//! the offset of the first tail partition, so the sum lines up with no
//! latency. One input spectrum feeds every kernel channel, so a stereo
//! reverb costs one forward FFT and two inverse FFTs per block.
//!
//! All buffers are allocated in `new`; `process` does not allocate.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Default partition size in frames.
pub const DEFAULT_PARTITION: usize = 512;

/// WebAudio-style convolver normalisation target (-58 dB).
const GAIN_CALIBRATION_DB: f32 = -58.0;
const MIN_POWER: f32 = 0.000125;

struct KernelChannel {
    /// First partition, time-reversed for the direct dot product.
    head: Vec<f32>,
    /// Spectra of the remaining partitions.
    partitions: Vec<Vec<Complex<f32>>>,
    output: Vec<f32>,
}

pub struct PartitionedConvolver {
    block: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    channels: Vec<KernelChannel>,
    /// Ring of input spectra, newest at `fdl_head`.
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_head: usize,
    /// Previous and current input block, time domain.
    window: Vec<f32>,
    fill: usize,
    /// Last B inputs, stored twice so they are always one contiguous slice.
    history: Vec<f32>,
    history_pos: usize,
    spectrum: Vec<Complex<f32>>,
    accumulator: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl PartitionedConvolver {
    /// Build a convolver for one or more kernel channels of equal length.
    pub fn new(kernels: &[Vec<f32>], block: usize) -> Self {
        let block = block.max(1);
        let fft_len = block * 2;

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let longest = kernels.iter().map(Vec::len).max().unwrap_or(0);
        let partition_count = longest.saturating_sub(block).div_ceil(block).max(1);

        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut scratch = vec![Complex::new(0.0, 0.0); scratch_len];

        let channels = kernels
            .iter()
            .map(|kernel| {
                let mut head = vec![0.0; block];
                for (slot, &tap) in head.iter_mut().rev().zip(kernel) {
                    *slot = tap;
                }
                let partitions = (0..partition_count)
                    .map(|p| {
                        let mut part = vec![Complex::new(0.0, 0.0); fft_len];
                        let start = (p + 1) * block;
                        let end = (start + block).min(kernel.len());
                        if start < end {
                            for (slot, &tap) in part.iter_mut().zip(&kernel[start..end]) {
                                slot.re = tap;
                            }
                        }
                        forward.process_with_scratch(&mut part, &mut scratch);
                        part
                    })
                    .collect();
                KernelChannel {
                    head,
                    partitions,
                    output: vec![0.0; block],
                }
            })
            .collect();

        Self {
            block,
            forward,
            inverse,
            channels,
            fdl: vec![vec![Complex::new(0.0, 0.0); fft_len]; partition_count],
            fdl_head: 0,
            window: vec![0.0; fft_len],
            fill: 0,
            history: vec![0.0; fft_len],
            history_pos: 0,
            spectrum: vec![Complex::new(0.0, 0.0); fft_len],
            accumulator: vec![Complex::new(0.0, 0.0); fft_len],
            scratch,
        }
    }

    /// Normalise `kernels` in place the way a WebAudio convolver does by
    /// default: scale to unit RMS power, then apply a fixed -58 dB gain.
    pub fn normalize(kernels: &mut [Vec<f32>]) {
        let total: usize = kernels.iter().map(Vec::len).sum();
        if total == 0 {
            return;
        }
        let sum_sq: f32 = kernels.iter().flatten().map(|s| s * s).sum();
        let mut power = (sum_sq / total as f32).sqrt();
        if !power.is_finite() || power < MIN_POWER {
            power = MIN_POWER;
        }
        let scale = 10f32.powf(GAIN_CALIBRATION_DB / 20.0) / power;
        for sample in kernels.iter_mut().flatten() {
            *sample *= scale;
        }
    }

    /// Convolve `input` into each of `outputs`, one slice per kernel channel.
    ///
    /// Every output slice must be at least `input.len()` long. Extra output
    /// slices beyond the channel count are left untouched.
    pub fn process(&mut self, input: &[f32], outputs: &mut [&mut [f32]]) {
        for (i, &x) in input.iter().enumerate() {
            self.window[self.block + self.fill] = x;

            self.history[self.history_pos] = x;
            self.history[self.history_pos + self.block] = x;
            let recent = &self.history[self.history_pos + 1..=self.history_pos + self.block];
            self.history_pos = (self.history_pos + 1) % self.block;

            for (channel, out) in self.channels.iter().zip(outputs.iter_mut()) {
                let direct: f32 = channel.head.iter().zip(recent).map(|(h, x)| h * x).sum();
                out[i] = direct + channel.output[self.fill];
            }
            self.fill += 1;
            if self.fill == self.block {
                self.run_block();
                self.fill = 0;
            }
        }
    }

    fn run_block(&mut self) {
        let fft_len = self.block * 2;

        for (slot, &x) in self.spectrum.iter_mut().zip(&self.window) {
            *slot = Complex::new(x, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let partitions = self.fdl.len();
        self.fdl_head = (self.fdl_head + partitions - 1) % partitions;
        self.fdl[self.fdl_head].copy_from_slice(&self.spectrum);

        let norm = 1.0 / fft_len as f32;
        for channel in &mut self.channels {
            self.accumulator.fill(Complex::new(0.0, 0.0));
            for (p, kernel) in channel.partitions.iter().enumerate() {
                let x = &self.fdl[(self.fdl_head + p) % partitions];
                for ((acc, &xk), &hk) in self.accumulator.iter_mut().zip(x).zip(kernel) {
                    *acc += xk * hk;
                }
            }
            self.inverse
                .process_with_scratch(&mut self.accumulator, &mut self.scratch);
            for (out, y) in channel
                .output
                .iter_mut()
                .zip(&self.accumulator[self.block..])
            {
                *out = y.re * norm;
            }
        }

        self.window.copy_within(self.block.., 0);
    }
}
