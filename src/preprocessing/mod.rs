//! Sample preprocessing modules
//!
//! Turns raw capture values into bounded per-step samples:
//! - Decibel rescaling against a floor
//! - Adaptive peak normalization (calibration)
//! - Channel mixing (left/right mean, signed remap) and RMS metering

pub mod channel_mixer;
pub mod normalization;
pub mod rescale;
