//! Calibration profile persistence
//!
//! Expansion factors measured while calibrating can be saved and restored
//! later, so training runs with frozen factors. Peaks are not stored; they
//! are rebuilt from the factors on restore.
//!
//! # Example
//!
//! ```
//! use audio_sensor::analysis::calibration::CalibrationProfile;
//! use audio_sensor::config::{SampleType, SignalType};
//!
//! let profile = CalibrationProfile {
//!     sample_type: SampleType::Amplitude,
//!     signal_type: SignalType::Mono,
//!     floor_db: -60.0,
//!     expansion_factors: vec![1.5],
//! };
//! let normalizer = profile.to_normalizer();
//! assert!((normalizer.peak(0) - 0.66).abs() < 1e-6);
//! ```

use crate::config::{SampleType, SensorConfig, SignalType};
use crate::error::SensorError;
use crate::preprocessing::normalization::PeakNormalizer;
use serde::{Deserialize, Serialize};

/// Saved expansion factors plus the settings they were measured under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// Sample type the factors belong to
    pub sample_type: SampleType,
    /// Signal type during calibration
    pub signal_type: SignalType,
    /// Decibel floor during calibration
    pub floor_db: f32,
    /// One factor for amplitudes, one per spectrum bin otherwise
    pub expansion_factors: Vec<f32>,
}

impl CalibrationProfile {
    /// Snapshot `normalizer` under `config`
    pub fn capture(config: &SensorConfig, normalizer: &PeakNormalizer) -> Self {
        Self {
            sample_type: config.sample_type(),
            signal_type: config.signal_type(),
            floor_db: config.floor_db(),
            expansion_factors: normalizer.factors().to_vec(),
        }
    }

    /// Check that the profile fits `config`
    ///
    /// Sample type and factor count must match. A differing signal type or
    /// floor is accepted with a warning, the factors just fit less well.
    pub fn validate(&self, config: &SensorConfig) -> Result<(), SensorError> {
        if self.sample_type != config.sample_type() {
            return Err(SensorError::InvalidInput(format!(
                "profile is for {:?} samples, sensor samples {:?}",
                self.sample_type,
                config.sample_type()
            )));
        }
        let expected = match config.sample_type() {
            SampleType::Spectrum => config.fft_resolution(),
            SampleType::Amplitude => 1,
        };
        if self.expansion_factors.len() != expected {
            return Err(SensorError::InvalidInput(format!(
                "profile has {} expansion factors, expected {}",
                self.expansion_factors.len(),
                expected
            )));
        }
        if self.expansion_factors.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            return Err(SensorError::InvalidInput(
                "expansion factors must be finite and positive".to_string(),
            ));
        }
        if self.signal_type != config.signal_type()
            || (self.floor_db - config.floor_db()).abs() > 1e-3
        {
            log::warn!(
                "Calibration measured with {:?} at {:.1} dB, sensor uses {:?} at {:.1} dB",
                self.signal_type,
                self.floor_db,
                config.signal_type(),
                config.floor_db()
            );
        }
        Ok(())
    }

    /// Rebuild a normalizer from the saved factors
    pub fn to_normalizer(&self) -> PeakNormalizer {
        PeakNormalizer::from_factors(self.expansion_factors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum_config() -> SensorConfig {
        let mut config = SensorConfig::default();
        config.set_fft_bit_width(6);
        config
    }

    #[test]
    fn test_capture_and_validate() {
        let config = spectrum_config();
        let mut normalizer = PeakNormalizer::new(64);
        normalizer.calibrate(10, 0.5);

        let profile = CalibrationProfile::capture(&config, &normalizer);
        assert_eq!(profile.expansion_factors.len(), 64);
        assert!(profile.validate(&config).is_ok());

        let restored = profile.to_normalizer();
        assert!((restored.peak(10) - 0.5).abs() < 1e-6);
        assert_eq!(restored.factors(), normalizer.factors());
    }

    #[test]
    fn test_rejects_wrong_sample_type() {
        let config = spectrum_config();
        let profile = CalibrationProfile {
            sample_type: SampleType::Amplitude,
            signal_type: SignalType::Stereo,
            floor_db: -60.0,
            expansion_factors: vec![1.0],
        };
        assert!(profile.validate(&config).is_err());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let config = spectrum_config();
        let normalizer = PeakNormalizer::new(128);
        let profile = CalibrationProfile::capture(&config, &normalizer);
        assert!(profile.validate(&config).is_err());
    }

    #[test]
    fn test_rejects_non_finite_factors() {
        let mut config = SensorConfig::default();
        config.set_sample_type(SampleType::Amplitude);
        let mut profile = CalibrationProfile::capture(&config, &PeakNormalizer::scalar());
        profile.expansion_factors[0] = f32::INFINITY;
        assert!(profile.validate(&config).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = SensorConfig::default();
        config.set_sample_type(SampleType::Amplitude);
        let mut normalizer = PeakNormalizer::scalar();
        normalizer.calibrate(0, 0.8);

        let profile = CalibrationProfile::capture(&config, &normalizer);
        let json = serde_json::to_string(&profile).unwrap();
        let back: CalibrationProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
