//! Layout and spectrum helpers
//!
//! - Frequency ↔ spectrum bin mapping
//! - Observation shape derivation
//! - FFT window functions

pub mod frequency;
pub mod shape;
pub mod window;
