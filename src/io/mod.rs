//! Audio I/O boundary
//!
//! The capture collaborator interface and the temporal sample buffer.

pub mod capture;
pub mod sample_buffer;
