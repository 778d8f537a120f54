//! Error types for the audio sensor

use std::fmt;

/// Errors that can occur while sampling audio into observations
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Write or step index outside the buffer layout
    ///
    /// Always a defect: the resolved shape and the pipeline's write count must agree.
    OutOfBounds(String),

    /// The capture collaborator could not supply samples this step
    CaptureUnavailable(String),

    /// Processing error during sampling
    ProcessingError(String),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            SensorError::OutOfBounds(msg) => write!(f, "Out of bounds: {}", msg),
            SensorError::CaptureUnavailable(msg) => write!(f, "Capture unavailable: {}", msg),
            SensorError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for SensorError {}
