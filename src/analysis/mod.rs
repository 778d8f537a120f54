//! Step results and calibration
//!
//! - Step report / outcome types
//! - Calibration profile persistence

pub mod calibration;
pub mod result;
