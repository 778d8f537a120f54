//! # Audio Sensor
//!
//! Turns a live audio stream into fixed-shape observation tensors for
//! reinforcement-learning agents, one temporal window at a time.
//!
//! ## Features
//!
//! - **Spectrum or waveform sampling**: FFT magnitudes over an observed
//!   frequency band, or raw amplitudes for one step's worth of audio
//! - **Decibel rescaling**: Values mapped onto `[0, 1]` against a configurable floor
//! - **Calibration**: Adaptive peak normalization with per-bin expansion factors
//! - **Temporal window**: Channels cycle through the most recent sampling steps
//! - **Step notifications**: Observers learn when a window is complete
//!
//! ## Quick Start
//!
//! ```
//! use audio_sensor::{AudioSampler, BlockCapture, SampleType, SamplingPipeline, SensorConfig};
//!
//! let mut config = SensorConfig::default();
//! config.set_sample_type(SampleType::Amplitude);
//! config.set_buffer_length(4);
//!
//! let mut capture = BlockCapture::new(48000);
//! capture.push_mono(&vec![0.25f32; 1024]);
//!
//! let mut pipeline = SamplingPipeline::new(config, capture);
//! pipeline.set_sampling_enabled(true);
//! let outcome = pipeline.step()?;
//!
//! println!("{}", pipeline.shape());
//! println!("{:?}", outcome);
//! # Ok::<(), audio_sensor::SensorError>(())
//! ```
//!
//! ## Architecture
//!
//! Each sampling step follows this flow:
//!
//! ```text
//! Capture → Rescale → Calibrate / Normalize → Ring Buffer → Observers
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod sampler;

// Re-export main types
pub use analysis::calibration::CalibrationProfile;
pub use analysis::result::{StepOutcome, StepReport};
pub use config::{SampleType, SensorConfig, SignalType};
pub use error::SensorError;
pub use features::shape::{ObservationShape, SensorLayout};
pub use features::window::FftWindow;
pub use io::capture::{AudioCapture, BlockCapture};
pub use io::sample_buffer::{ObservationTensor, TemporalRingBuffer};
pub use sampler::observer::{AudioSampler, ObserverId, StepObserver};
pub use sampler::pipeline::SamplingPipeline;
pub use sampler::proxy::SamplerProxy;

/// Observation shape a sensor with `config` produces at `sample_rate`
///
/// Lets a host declare the observation space before any audio is captured.
///
/// # Example
///
/// ```
/// use audio_sensor::{observation_shape, SensorConfig};
///
/// let shape = observation_shape(&SensorConfig::default(), 48000);
/// assert_eq!(shape.to_array(), [29, 30, 2]);
/// ```
pub fn observation_shape(config: &SensorConfig, sample_rate: u32) -> ObservationShape {
    features::shape::resolve_layout(config, sample_rate).shape
}
