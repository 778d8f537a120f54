//! Audio capture collaborator
//!
//! The sensor never performs audio I/O itself. It pulls fixed-size arrays of
//! waveform samples or spectrum magnitudes from an [`AudioCapture`]
//! implementation once per sampling step.
//!
//! [`BlockCapture`] is a software implementation for hosts that can hand over
//! raw PCM: it keeps the most recent frames per channel and computes spectra
//! with `rustfft` on request.
//!
//! # Example
//!
//! ```
//! use audio_sensor::io::capture::{AudioCapture, BlockCapture};
//! use audio_sensor::features::window::FftWindow;
//!
//! let mut capture = BlockCapture::new(48000);
//! capture.push_interleaved(&vec![0.25f32; 4096]);
//!
//! let mut spectrum = vec![0.0f32; 1024];
//! capture.spectrum_data(&mut spectrum, 0, FftWindow::Hanning)?;
//! assert!(spectrum.iter().all(|&m| m >= 0.0));
//! # Ok::<(), audio_sensor::SensorError>(())
//! ```

use crate::error::SensorError;
use crate::features::window::FftWindow;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::collections::VecDeque;

/// Frames of history kept per channel: twice the largest spectrum resolution
pub const MAX_HISTORY_FRAMES: usize = 2 * 8192;

/// Source of raw samples, queried synchronously once per sampling step
pub trait AudioCapture {
    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Fill `samples` with the most recent waveform values of `channel`
    /// (0 = left, 1 = right), in `[-1, 1]`
    fn output_data(&mut self, samples: &mut [f32], channel: usize) -> Result<(), SensorError>;

    /// Fill `samples` with spectrum magnitudes (≥ 0) of `channel`, one per bin
    fn spectrum_data(
        &mut self,
        samples: &mut [f32],
        channel: usize,
        window: FftWindow,
    ) -> Result<(), SensorError>;
}

impl<C: AudioCapture + ?Sized> AudioCapture for Box<C> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn output_data(&mut self, samples: &mut [f32], channel: usize) -> Result<(), SensorError> {
        (**self).output_data(samples, channel)
    }

    fn spectrum_data(
        &mut self,
        samples: &mut [f32],
        channel: usize,
        window: FftWindow,
    ) -> Result<(), SensorError> {
        (**self).spectrum_data(samples, channel, window)
    }
}

/// Capture over PCM pushed by the host
pub struct BlockCapture {
    sample_rate: u32,
    channels: [VecDeque<f32>; 2],
    received: bool,
    planner: FftPlanner<f32>,
}

impl std::fmt::Debug for BlockCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockCapture")
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.channels[0].len())
            .field("received", &self.received)
            .finish()
    }
}

impl BlockCapture {
    /// Empty capture at `sample_rate` Hz
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: [
                VecDeque::with_capacity(MAX_HISTORY_FRAMES),
                VecDeque::with_capacity(MAX_HISTORY_FRAMES),
            ],
            received: false,
            planner: FftPlanner::new(),
        }
    }

    fn push_frame(&mut self, left: f32, right: f32) {
        for (queue, sample) in self.channels.iter_mut().zip([left, right]) {
            if queue.len() == MAX_HISTORY_FRAMES {
                queue.pop_front();
            }
            queue.push_back(sample);
        }
    }

    /// Append interleaved stereo frames `[l0, r0, l1, r1, ...]`
    ///
    /// A trailing half frame is ignored.
    pub fn push_interleaved(&mut self, frames: &[f32]) {
        for frame in frames.chunks_exact(2) {
            self.push_frame(frame[0], frame[1]);
        }
        self.received |= frames.len() >= 2;
    }

    /// Append split left/right blocks of equal length
    pub fn push_stereo(&mut self, left: &[f32], right: &[f32]) -> Result<(), SensorError> {
        if left.len() != right.len() {
            return Err(SensorError::InvalidInput(format!(
                "left has {} samples, right has {}",
                left.len(),
                right.len()
            )));
        }
        for (&l, &r) in left.iter().zip(right) {
            self.push_frame(l, r);
        }
        self.received |= !left.is_empty();
        Ok(())
    }

    /// Append a mono block to both channels
    pub fn push_mono(&mut self, samples: &[f32]) {
        for &s in samples {
            self.push_frame(s, s);
        }
        self.received |= !samples.is_empty();
    }

    /// Frames currently held per channel
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    /// Drop all history; requests fail until new audio arrives
    pub fn clear(&mut self) {
        self.channels.iter_mut().for_each(VecDeque::clear);
        self.received = false;
    }

    fn history(&self, channel: usize) -> Result<&VecDeque<f32>, SensorError> {
        if !self.received {
            return Err(SensorError::CaptureUnavailable(
                "no audio received yet".to_string(),
            ));
        }
        self.channels.get(channel).ok_or_else(|| {
            SensorError::InvalidInput(format!("channel {} not available", channel))
        })
    }

    /// Copy the newest `out.len()` samples, zero-padding the front if short
    fn copy_recent(&self, out: &mut [f32], channel: usize) -> Result<(), SensorError> {
        let history = self.history(channel)?;
        let available = history.len().min(out.len());
        let pad = out.len() - available;
        out[..pad].iter_mut().for_each(|v| *v = 0.0);
        let start = history.len() - available;
        for (dst, &src) in out[pad..].iter_mut().zip(history.range(start..)) {
            *dst = src;
        }
        Ok(())
    }
}

impl AudioCapture for BlockCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn output_data(&mut self, samples: &mut [f32], channel: usize) -> Result<(), SensorError> {
        self.copy_recent(samples, channel)
    }

    /// Single-sided magnitudes `2 · |X[k + 1]| / Σw` of a `2 · samples.len()` FFT
    fn spectrum_data(
        &mut self,
        samples: &mut [f32],
        channel: usize,
        window: FftWindow,
    ) -> Result<(), SensorError> {
        let bins = samples.len();
        if bins == 0 {
            return Ok(());
        }
        let fft_size = bins * 2;
        if fft_size > MAX_HISTORY_FRAMES {
            return Err(SensorError::InvalidInput(format!(
                "{} bins exceed the capture history",
                bins
            )));
        }

        let mut block = vec![0.0f32; fft_size];
        self.copy_recent(&mut block, channel)?;

        let coefficients = window.coefficients(fft_size);
        let window_sum: f32 = coefficients.iter().sum();
        let mut buffer: Vec<Complex<f32>> = block
            .iter()
            .zip(&coefficients)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(fft_size);
        fft.process(&mut buffer);

        // Slot k holds FFT bin k + 1 (DC dropped, Nyquist kept), matching
        // FrequencyMapper's `(k + 1) / harmonic` bin centres.
        let scale = if window_sum > 0.0 { 2.0 / window_sum } else { 0.0 };
        for (dst, bin) in samples.iter_mut().zip(&buffer[1..=bins]) {
            *dst = bin.norm() * scale;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::frequency::FrequencyMapper;
    use std::f32::consts::PI;

    fn sine(freq: f32, amplitude: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_unavailable_before_audio() {
        let mut capture = BlockCapture::new(48000);
        let mut out = vec![0.0; 16];
        let result = capture.output_data(&mut out, 0);
        assert!(matches!(result, Err(SensorError::CaptureUnavailable(_))));
        let result = capture.spectrum_data(&mut out, 1, FftWindow::Rectangular);
        assert!(matches!(result, Err(SensorError::CaptureUnavailable(_))));
    }

    #[test]
    fn test_output_data_returns_newest_samples() {
        let mut capture = BlockCapture::new(48000);
        capture.push_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);

        let mut left = vec![9.0; 2];
        capture.output_data(&mut left, 0).unwrap();
        assert_eq!(left, vec![0.2, 0.3]);

        let mut right = vec![9.0; 5];
        capture.output_data(&mut right, 1).unwrap();
        assert_eq!(right, vec![0.0, 0.0, -0.1, -0.2, -0.3]);

        assert!(capture.output_data(&mut right, 2).is_err());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut capture = BlockCapture::new(48000);
        capture.push_mono(&vec![0.5; MAX_HISTORY_FRAMES + 100]);
        assert_eq!(capture.frames(), MAX_HISTORY_FRAMES);
        capture.clear();
        assert_eq!(capture.frames(), 0);
    }

    #[test]
    fn test_push_stereo_length_mismatch() {
        let mut capture = BlockCapture::new(48000);
        assert!(capture.push_stereo(&[0.0; 3], &[0.0; 2]).is_err());
    }

    #[test]
    fn test_sine_peaks_at_mapped_bin() {
        let sample_rate = 48000;
        let bins = 512;
        let k = 40;
        let freq = FrequencyMapper::new(sample_rate, bins).index_to_frequency(k);

        let mut capture = BlockCapture::new(sample_rate);
        capture.push_mono(&sine(freq, 0.8, sample_rate, 4096));

        let mut spectrum = vec![0.0f32; bins];
        capture
            .spectrum_data(&mut spectrum, 0, FftWindow::Rectangular)
            .unwrap();

        let (peak_bin, &peak) = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(peak_bin, k, "slot matches FrequencyMapper's index");
        assert_eq!(FrequencyMapper::new(sample_rate, bins).frequency_to_index(freq), k);
        assert!((peak - 0.8).abs() < 0.02, "peak magnitude {}", peak);
        assert!(spectrum[k - 1] < 0.01 && spectrum[k + 1] < 0.01);
        assert!(spectrum.iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn test_dc_is_not_reported() {
        let mut capture = BlockCapture::new(48000);
        capture.push_mono(&vec![0.5; 2048]);
        let mut spectrum = vec![1.0f32; 512];
        capture
            .spectrum_data(&mut spectrum, 0, FftWindow::Rectangular)
            .unwrap();
        assert!(spectrum.iter().all(|&m| m < 1e-4), "constant input has only a DC bin");
    }

    #[test]
    fn test_windowed_spectrum_of_silence() {
        let mut capture = BlockCapture::new(44100);
        capture.push_mono(&vec![0.0; 2048]);
        let mut spectrum = vec![1.0f32; 256];
        capture
            .spectrum_data(&mut spectrum, 0, FftWindow::BlackmanHarris)
            .unwrap();
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }
}
