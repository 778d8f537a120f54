//! FFT window functions
//!
//! The window type is part of the sensor configuration and is handed to the
//! capture collaborator whenever spectrum data is requested.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Window applied to a sample block before the forward FFT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FftWindow {
    /// No tapering
    #[default]
    Rectangular,
    /// Triangular (Bartlett) window
    Triangle,
    /// Hamming window
    Hamming,
    /// Hann window
    Hanning,
    /// Classic three-term Blackman window
    Blackman,
    /// Four-term Blackman-Harris window
    BlackmanHarris,
}

impl FftWindow {
    /// Window coefficients for a block of `len` samples
    pub fn coefficients(&self, len: usize) -> Vec<f32> {
        if len <= 1 {
            return vec![1.0; len];
        }
        let m = (len - 1) as f32;
        (0..len)
            .map(|i| {
                let x = i as f32 / m;
                match self {
                    FftWindow::Rectangular => 1.0,
                    FftWindow::Triangle => 1.0 - (2.0 * x - 1.0).abs(),
                    FftWindow::Hamming => 0.54 - 0.46 * (2.0 * PI * x).cos(),
                    FftWindow::Hanning => 0.5 - 0.5 * (2.0 * PI * x).cos(),
                    FftWindow::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
                    }
                    FftWindow::BlackmanHarris => {
                        0.35875 - 0.48829 * (2.0 * PI * x).cos() + 0.14128 * (4.0 * PI * x).cos()
                            - 0.01168 * (6.0 * PI * x).cos()
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_is_flat() {
        assert!(FftWindow::Rectangular.coefficients(16).iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_tapered_windows_are_symmetric() {
        for window in [
            FftWindow::Triangle,
            FftWindow::Hamming,
            FftWindow::Hanning,
            FftWindow::Blackman,
            FftWindow::BlackmanHarris,
        ] {
            let w = window.coefficients(65);
            for i in 0..w.len() {
                assert!(
                    (w[i] - w[w.len() - 1 - i]).abs() < 1e-5,
                    "{:?} not symmetric at {}",
                    window,
                    i
                );
            }
            // Peak in the middle, near 1.0
            assert!((w[32] - 1.0).abs() < 1e-3, "{:?} center = {}", window, w[32]);
            assert!(w[0] < 0.1, "{:?} edge = {}", window, w[0]);
        }
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(FftWindow::Hanning.coefficients(0).is_empty());
        assert_eq!(FftWindow::Hanning.coefficients(1), vec![1.0]);
    }
}
