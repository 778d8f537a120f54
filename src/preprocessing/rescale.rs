//! Decibel rescaling of raw sample values
//!
//! Maps a raw amplitude (or spectrum magnitude) onto a linear decibel scale
//! relative to a configurable floor:
//!
//! ```text
//! scaled = max(20 · log10(|amplitude|), floor_db) / −floor_db + 1
//! ```
//!
//! 0 dB maps to exactly 1.0 and anything at or below the floor maps to 0.0.
//! Values above 0 dB exceed 1.0 and are left as they are; clamping only
//! happens during normalization.
//!
//! # Example
//!
//! ```
//! use audio_sensor::preprocessing::rescale::rescale;
//!
//! assert_eq!(rescale(1.0, -60.0), 1.0);
//! assert_eq!(rescale(0.0, -60.0), 0.0);
//! assert!((rescale(0.5, -60.0) - 0.8995).abs() < 1e-3);
//! ```

/// Convert an amplitude in `[-1, 1]` to decibels
///
/// Zero maps to negative infinity.
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.abs().log10()
}

/// Convert decibels to a linear amplitude
pub fn db_to_amplitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Rescale a raw sample value against `floor_db` (negative)
pub fn rescale(amplitude: f32, floor_db: f32) -> f32 {
    amplitude_to_db(amplitude).max(floor_db) / -floor_db + 1.0
}
