//! Frequency ↔ spectrum bin mapping
//!
//! Maps between linear frequency, a logarithmic position in `[0, 1]` over the
//! audible band (20 Hz – 20 kHz), and the index of the spectrum bin a
//! frequency falls into for a given capture sample rate and resolution.
//!
//! # Example
//!
//! ```
//! use audio_sensor::features::frequency::FrequencyMapper;
//!
//! let mapper = FrequencyMapper::new(48000, 1024);
//! let index = mapper.frequency_to_index(440.0);
//! assert_eq!(mapper.frequency_to_index(mapper.index_to_frequency(index)), index);
//! ```

/// log10(20 Hz), lower bound of the audible band
pub const LOG_20HZ: f32 = 1.301_03;

/// log10(20 kHz), upper bound of the audible band
pub const LOG_20KHZ: f32 = 4.301_03;

/// Width of the audible band in log10 units
pub const LOG_RANGE: f32 = LOG_20KHZ - LOG_20HZ;

/// Bidirectional mapping between frequencies and spectrum bin indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyMapper {
    resolution: usize,
    sample_rate: u32,
    /// Bins per Hz: `2 · resolution / sample_rate`
    harmonic: f32,
}

impl FrequencyMapper {
    /// Create a mapper for `resolution` spectrum bins captured at `sample_rate` Hz
    pub fn new(sample_rate: u32, resolution: usize) -> Self {
        let sample_rate = sample_rate.max(1);
        let resolution = resolution.max(1);
        Self {
            resolution,
            sample_rate,
            harmonic: 1.0 / sample_rate as f32 * resolution as f32 * 2.0,
        }
    }

    /// Number of spectrum bins
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Capture sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bins per Hz
    pub fn harmonic(&self) -> f32 {
        self.harmonic
    }

    /// Index of the spectrum bin containing `frequency`
    ///
    /// `max(0, round(frequency · harmonic) − 1)`, additionally capped at the
    /// last bin. Monotonic non-decreasing in `frequency`.
    pub fn frequency_to_index(&self, frequency: f32) -> usize {
        let index = (frequency * self.harmonic).round_ties_even() - 1.0;
        if index.is_nan() || index <= 0.0 {
            return 0;
        }
        (index as usize).min(self.resolution - 1)
    }

    /// Frequency at the center of bin `index`
    pub fn index_to_frequency(&self, index: usize) -> f32 {
        (index + 1) as f32 / self.harmonic
    }
}

/// Map a frequency onto `[0, 1]` logarithmically over 20 Hz – 20 kHz
///
/// Frequencies outside the band are clamped first.
pub fn normalize_frequency(frequency: f32) -> f32 {
    let log = frequency.log10().clamp(LOG_20HZ, LOG_20KHZ);
    (log - LOG_20HZ) / LOG_RANGE
}

/// Inverse of [`normalize_frequency`]
pub fn denormalize_frequency(normalized: f32) -> f32 {
    10.0_f32.powf(normalized * LOG_RANGE + LOG_20HZ)
}

/// Clamp a log10 frequency into the audible band
pub fn clamp_frequency_log(log: f32) -> f32 {
    if log.is_nan() {
        return LOG_20HZ;
    }
    log.clamp(LOG_20HZ, LOG_20KHZ)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_constants() {
        assert!((LOG_20HZ - 20.0f32.log10()).abs() < 1e-6);
        assert!((LOG_20KHZ - 20000.0f32.log10()).abs() < 1e-6);
    }

    #[test]
    fn test_index_round_trip_all_bins() {
        for &(rate, resolution) in &[(48000u32, 64usize), (44100, 1024), (48000, 8192)] {
            let mapper = FrequencyMapper::new(rate, resolution);
            for i in 0..resolution {
                let freq = mapper.index_to_frequency(i);
                assert_eq!(
                    mapper.frequency_to_index(freq),
                    i,
                    "bin {} at {} Hz, resolution {}",
                    i,
                    rate,
                    resolution
                );
            }
        }
    }

    #[test]
    fn test_frequency_to_index_monotonic() {
        let mapper = FrequencyMapper::new(48000, 1024);
        let mut previous = 0;
        let mut freq = 0.0f32;
        while freq < 24000.0 {
            let index = mapper.frequency_to_index(freq);
            assert!(index >= previous, "index decreased at {} Hz", freq);
            previous = index;
            freq += 3.7;
        }
    }

    #[test]
    fn test_frequency_to_index_clamps() {
        let mapper = FrequencyMapper::new(48000, 1024);
        assert_eq!(mapper.frequency_to_index(0.0), 0);
        assert_eq!(mapper.frequency_to_index(-100.0), 0);
        assert_eq!(mapper.frequency_to_index(f32::NAN), 0);

        // A low sample rate pushes 20 kHz past the last bin.
        let low = FrequencyMapper::new(8000, 256);
        assert_eq!(low.frequency_to_index(20000.0), 255);
    }

    #[test]
    fn test_known_bins() {
        // harmonic = 2048 / 48000
        let mapper = FrequencyMapper::new(48000, 1024);
        assert_eq!(mapper.frequency_to_index(20.0), 0);
        assert_eq!(mapper.frequency_to_index(20000.0), 852);
    }

    #[test]
    fn test_normalize_frequency_bounds() {
        assert!(normalize_frequency(20.0).abs() < 1e-6);
        assert!((normalize_frequency(20000.0) - 1.0).abs() < 1e-6);
        assert_eq!(normalize_frequency(5.0), 0.0);
        assert_eq!(normalize_frequency(96000.0), 1.0);
    }

    #[test]
    fn test_normalize_round_trip() {
        for i in 0..=100 {
            let x = i as f32 / 100.0;
            let back = normalize_frequency(denormalize_frequency(x));
            assert!((back - x).abs() < 1e-5, "round trip {} -> {}", x, back);
        }
    }

    #[test]
    fn test_clamp_frequency_log() {
        assert_eq!(clamp_frequency_log(0.0), LOG_20HZ);
        assert_eq!(clamp_frequency_log(5.0), LOG_20KHZ);
        assert_eq!(clamp_frequency_log(3.0), 3.0);
        assert_eq!(clamp_frequency_log(f32::NAN), LOG_20HZ);
    }
}
