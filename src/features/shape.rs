//! Observation shape derivation
//!
//! Derives the `(height, width, channels)` tensor shape from the buffer
//! length, signal type and samples per channel. Each channel holds one
//! signal channel of one sampling step, laid out on a near-square grid.

use crate::config::{SampleType, SensorConfig, SignalType};
use crate::features::frequency::FrequencyMapper;
use serde::{Deserialize, Serialize};

/// Shape of the observation tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservationShape {
    /// Grid rows
    pub height: usize,
    /// Grid columns
    pub width: usize,
    /// `buffer_length · signal_channels`
    pub channels: usize,
    /// Channels written per sampling step (2 for stereo, 1 for mono)
    pub signal_channels: usize,
}

impl ObservationShape {
    /// Shape for `samples_per_channel` values over `buffer_length` steps
    pub fn new(samples_per_channel: usize, buffer_length: usize, signal_type: SignalType) -> Self {
        let (width, height) = square_dimensions(samples_per_channel);
        let signal_channels = signal_type.channels();
        Self {
            height,
            width,
            channels: buffer_length * signal_channels,
            signal_channels,
        }
    }

    /// Cells per channel, including padding
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Total tensor length
    pub fn len(&self) -> usize {
        self.area() * self.channels
    }

    /// Whether the tensor holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of sampling steps in the temporal window
    pub fn buffer_length(&self) -> usize {
        self.channels / self.signal_channels.max(1)
    }

    /// `[height, width, channels]`
    pub fn to_array(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }
}

impl std::fmt::Display for ObservationShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sensor shape: {} x {} x {}",
            self.height, self.width, self.channels
        )
    }
}

/// Find a near-square grid for `samples` cells
///
/// `width = ceil(sqrt(n))`, `height = width − floor((width² − n) / width)`,
/// so `width · height ≥ n` with less than one row of padding.
pub fn square_dimensions(samples: usize) -> (usize, usize) {
    let samples = samples.max(1);
    let mut width = (samples as f64).sqrt().ceil() as usize;
    // Guard against float error around perfect squares.
    while width * width < samples {
        width += 1;
    }
    while width > 1 && (width - 1) * (width - 1) >= samples {
        width -= 1;
    }
    let height = width - (width * width - samples) / width;
    (width, height)
}

/// Smallest power of two ≥ `sample_rate · step_duration_secs`
pub fn amplitude_sample_count(sample_rate: u32, step_duration_secs: f32) -> usize {
    // f32 durations such as 0.025 widen to slightly above their decimal value
    let product = sample_rate as f64 * step_duration_secs as f64;
    let samples = ((product * 1e3).round() / 1e3).ceil();
    if !samples.is_finite() || samples < 1.0 {
        return 1;
    }
    (samples as usize).next_power_of_two()
}

/// Everything derived from the configuration that sizes the sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorLayout {
    /// Tensor shape
    pub shape: ObservationShape,
    /// Values written per channel each step
    pub samples_per_channel: usize,
    /// Length of the raw sample arrays requested from capture
    pub capture_len: usize,
    /// Observed spectrum bins, min and max inclusive (`None` for amplitudes)
    pub bin_range: Option<(usize, usize)>,
    /// Frequency mapper for the configured resolution
    pub mapper: FrequencyMapper,
}

/// Resolve the sensor layout for `config` at `sample_rate`
///
/// Pure and idempotent: identical inputs always give an identical layout.
pub fn resolve_layout(config: &SensorConfig, sample_rate: u32) -> SensorLayout {
    let resolution = config.fft_resolution();
    let mapper = FrequencyMapper::new(sample_rate, resolution);

    let (samples_per_channel, capture_len, bin_range) = match config.sample_type() {
        SampleType::Spectrum => {
            let min_index = mapper.frequency_to_index(config.min_frequency());
            let max_index = mapper.frequency_to_index(config.max_frequency()).max(min_index);
            (max_index - min_index + 1, resolution, Some((min_index, max_index)))
        }
        SampleType::Amplitude => {
            let count = amplitude_sample_count(sample_rate, config.step_duration_secs());
            (count, count, None)
        }
    };

    let shape = ObservationShape::new(
        samples_per_channel,
        config.buffer_length(),
        config.signal_type(),
    );
    log::debug!(
        "{} ({} samples per channel, {:?})",
        shape,
        samples_per_channel,
        bin_range
    );

    SensorLayout {
        shape,
        samples_per_channel,
        capture_len,
        bin_range,
        mapper,
    }
}
