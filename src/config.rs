//! Configuration parameters for the audio sensor
//!
//! Every setter clamps its input into the documented range instead of
//! rejecting it. The clamped ranges are authoritative.

use crate::features::frequency::{clamp_frequency_log, LOG_20HZ, LOG_20KHZ};
use crate::features::shape::{resolve_layout, SensorLayout};
use crate::features::window::FftWindow;
use serde::{Deserialize, Serialize};

/// Smallest temporal window, in sampling steps
pub const MIN_BUFFER_LENGTH: usize = 1;
/// Largest temporal window, in sampling steps
pub const MAX_BUFFER_LENGTH: usize = 100;
/// Smallest FFT bit width (64 bins)
pub const MIN_FFT_BIT_WIDTH: u32 = 6;
/// Largest FFT bit width (8192 bins)
pub const MAX_FFT_BIT_WIDTH: u32 = 13;
/// Lowest floor slider value (−192 dB)
pub const MIN_FLOOR_LOG: f32 = -6.0;
/// Highest floor slider value (−12 dB)
pub const MAX_FLOOR_LOG: f32 = -2.0;
/// Floor slider value for −60 dB
pub const DEFAULT_FLOOR_LOG: f32 = -4.321_928;

/// Signal channel layout
///
/// `Stereo` keeps left and right apart, `Mono` samples their mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignalType {
    /// Left and right sampled separately
    #[default]
    Stereo,
    /// Mean of left and right
    Mono,
}

impl SignalType {
    /// Buffer channels written per sampling step
    pub fn channels(&self) -> usize {
        match self {
            SignalType::Stereo => 2,
            SignalType::Mono => 1,
        }
    }
}

/// Raw sample source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleType {
    /// Waveform amplitudes in `[-1, 1]`
    Amplitude,
    /// FFT bin magnitudes
    #[default]
    Spectrum,
}

/// Sensor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    sensor_name: String,
    buffer_length: usize,
    signal_type: SignalType,
    sample_type: SampleType,
    fft_window: FftWindow,
    fft_bit_width: u32,
    min_frequency_log: f32,
    max_frequency_log: f32,
    fft_floor_log: f32,
    amp_floor_log: f32,
    normalize: bool,
    step_duration_secs: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sensor_name: "AudioSensor".to_string(),
            buffer_length: 1,
            signal_type: SignalType::Stereo,
            sample_type: SampleType::Spectrum,
            fft_window: FftWindow::Rectangular,
            fft_bit_width: 10,
            min_frequency_log: LOG_20HZ,
            max_frequency_log: LOG_20KHZ,
            fft_floor_log: DEFAULT_FLOOR_LOG,
            amp_floor_log: DEFAULT_FLOOR_LOG,
            normalize: false,
            step_duration_secs: 0.02,
        }
    }
}

/// Convert a floor slider value into decibels: `−3 · 2^(−log)`
pub fn floor_log_to_db(log: f32) -> f32 {
    -3.0 * 2.0_f32.powf(-log)
}

/// Convert decibels into a floor slider value: `−log2(dB / −3)`
pub fn floor_db_to_log(db: f32) -> f32 {
    -(db / -3.0).log2()
}

fn clamp_floor_log(log: f32) -> f32 {
    if log.is_nan() {
        return DEFAULT_FLOOR_LOG;
    }
    log.clamp(MIN_FLOOR_LOG, MAX_FLOOR_LOG)
}

impl SensorConfig {
    /// Re-clamp every field, e.g. after deserializing
    pub fn validated(mut self) -> Self {
        self.set_buffer_length(self.buffer_length);
        self.set_fft_bit_width(self.fft_bit_width);
        self.set_min_frequency_log(self.min_frequency_log);
        self.set_max_frequency_log(self.max_frequency_log);
        self.set_fft_floor_log(self.fft_floor_log);
        self.set_amp_floor_log(self.amp_floor_log);
        self.set_step_duration_secs(self.step_duration_secs);
        self
    }

    /// Name of the generated sensor
    pub fn sensor_name(&self) -> &str {
        &self.sensor_name
    }

    /// Set the sensor name
    pub fn set_sensor_name(&mut self, name: impl Into<String>) {
        self.sensor_name = name.into();
    }

    /// Temporal window length in sampling steps
    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    /// Set the temporal window length, clamped to `[1, 100]`
    pub fn set_buffer_length(&mut self, steps: usize) {
        let clamped = steps.clamp(MIN_BUFFER_LENGTH, MAX_BUFFER_LENGTH);
        if clamped != steps {
            log::debug!("Buffer length {} clamped to {}", steps, clamped);
        }
        self.buffer_length = clamped;
    }

    /// Signal channel layout
    pub fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    /// Set the signal channel layout
    pub fn set_signal_type(&mut self, signal_type: SignalType) {
        self.signal_type = signal_type;
    }

    /// Raw sample source
    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Set the raw sample source
    pub fn set_sample_type(&mut self, sample_type: SampleType) {
        self.sample_type = sample_type;
    }

    /// Window forwarded to the capture collaborator for spectrum requests
    pub fn fft_window(&self) -> FftWindow {
        self.fft_window
    }

    /// Set the FFT window
    pub fn set_fft_window(&mut self, window: FftWindow) {
        self.fft_window = window;
    }

    /// Spectrum resolution as a power-of-two exponent
    pub fn fft_bit_width(&self) -> u32 {
        self.fft_bit_width
    }

    /// Set the spectrum bit width, clamped to `[6, 13]`
    pub fn set_fft_bit_width(&mut self, bits: u32) {
        let clamped = bits.clamp(MIN_FFT_BIT_WIDTH, MAX_FFT_BIT_WIDTH);
        if clamped != bits {
            log::debug!("FFT bit width {} clamped to {}", bits, clamped);
        }
        self.fft_bit_width = clamped;
    }

    /// Number of sampled spectrum bins (not the number of observed bins)
    pub fn fft_resolution(&self) -> usize {
        1 << self.fft_bit_width
    }

    /// Set the spectrum resolution; rounded down to a power of two, then clamped
    pub fn set_fft_resolution(&mut self, resolution: usize) {
        let bits = usize::BITS - 1 - resolution.max(1).leading_zeros();
        self.set_fft_bit_width(bits);
    }

    /// log10 of the lowest observed frequency
    pub fn min_frequency_log(&self) -> f32 {
        self.min_frequency_log
    }

    /// Set log10 of the lowest observed frequency, clamped to the audible band
    pub fn set_min_frequency_log(&mut self, log: f32) {
        self.min_frequency_log = clamp_frequency_log(log);
        self.warn_inverted_band();
    }

    /// log10 of the highest observed frequency
    pub fn max_frequency_log(&self) -> f32 {
        self.max_frequency_log
    }

    /// Set log10 of the highest observed frequency, clamped to the audible band
    pub fn set_max_frequency_log(&mut self, log: f32) {
        self.max_frequency_log = clamp_frequency_log(log);
        self.warn_inverted_band();
    }

    /// Lowest observed frequency in Hz
    pub fn min_frequency(&self) -> f32 {
        10.0_f32.powf(self.min_frequency_log)
    }

    /// Set the lowest observed frequency in Hz
    pub fn set_min_frequency(&mut self, hz: f32) {
        self.set_min_frequency_log(hz.log10());
    }

    /// Highest observed frequency in Hz
    pub fn max_frequency(&self) -> f32 {
        10.0_f32.powf(self.max_frequency_log)
    }

    /// Set the highest observed frequency in Hz
    pub fn set_max_frequency(&mut self, hz: f32) {
        self.set_max_frequency_log(hz.log10());
    }

    fn warn_inverted_band(&self) {
        if self.min_frequency_log > self.max_frequency_log {
            log::warn!(
                "Observed band is inverted: min {:.1} Hz > max {:.1} Hz",
                self.min_frequency(),
                self.max_frequency()
            );
        }
    }

    /// Spectrum floor slider value
    pub fn fft_floor_log(&self) -> f32 {
        self.fft_floor_log
    }

    /// Set the spectrum floor slider value, clamped to `[-6, -2]`
    pub fn set_fft_floor_log(&mut self, log: f32) {
        self.fft_floor_log = clamp_floor_log(log);
    }

    /// Spectrum decibel floor
    pub fn fft_floor_db(&self) -> f32 {
        floor_log_to_db(self.fft_floor_log)
    }

    /// Set the spectrum decibel floor (≈ −192 dB to −12 dB)
    pub fn set_fft_floor_db(&mut self, db: f32) {
        self.set_fft_floor_log(floor_db_to_log(db));
    }

    /// Amplitude floor slider value
    pub fn amp_floor_log(&self) -> f32 {
        self.amp_floor_log
    }

    /// Set the amplitude floor slider value, clamped to `[-6, -2]`
    pub fn set_amp_floor_log(&mut self, log: f32) {
        self.amp_floor_log = clamp_floor_log(log);
    }

    /// Amplitude decibel floor
    pub fn amp_floor_db(&self) -> f32 {
        floor_log_to_db(self.amp_floor_log)
    }

    /// Set the amplitude decibel floor (≈ −192 dB to −12 dB)
    pub fn set_amp_floor_db(&mut self, db: f32) {
        self.set_amp_floor_log(floor_db_to_log(db));
    }

    /// Decibel floor for the active sample type
    pub fn floor_db(&self) -> f32 {
        match self.sample_type {
            SampleType::Spectrum => self.fft_floor_db(),
            SampleType::Amplitude => self.amp_floor_db(),
        }
    }

    /// Whether expansion factors are applied
    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// Enable or disable normalization
    pub fn set_normalize(&mut self, normalize: bool) {
        self.normalize = normalize;
    }

    /// Interval between sampling steps in seconds
    pub fn step_duration_secs(&self) -> f32 {
        self.step_duration_secs
    }

    /// Set the sampling interval; non-positive values fall back to 20 ms
    pub fn set_step_duration_secs(&mut self, secs: f32) {
        self.step_duration_secs = if secs.is_finite() && secs > 0.0 {
            secs
        } else {
            0.02
        };
    }

    /// Temporal window length in seconds
    pub fn buffer_duration_secs(&self) -> f32 {
        self.step_duration_secs * self.buffer_length as f32
    }
}

/// Outcome of comparing two configurations
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Freshly resolved layout when the buffer must be reallocated
    pub layout: Option<SensorLayout>,
    /// Whether measured peaks and expansion factors are no longer valid
    pub reset_normalization: bool,
}

impl Reconciliation {
    /// Whether nothing needs to change
    pub fn is_noop(&self) -> bool {
        self.layout.is_none() && !self.reset_normalization
    }
}

/// Decide which derived state a configuration change invalidates
///
/// The buffer is reallocated whenever the resolved layout differs. Peaks are
/// dropped when the sample type or resolution changes, or when a setting the
/// active sample type's scaling depends on changes. The observed frequency
/// band never invalidates peaks: calibration covers the full spectrum.
pub fn reconcile(old: &SensorConfig, new: &SensorConfig, sample_rate: u32) -> Reconciliation {
    let old_layout = resolve_layout(old, sample_rate);
    let new_layout = resolve_layout(new, sample_rate);
    let layout = (old_layout != new_layout).then_some(new_layout);

    let sample_size_changed =
        old.sample_type != new.sample_type || old.fft_bit_width != new.fft_bit_width;
    let scaling_changed = match new.sample_type {
        SampleType::Spectrum => {
            old.signal_type != new.signal_type
                || old.fft_window != new.fft_window
                || old.fft_floor_log != new.fft_floor_log
        }
        SampleType::Amplitude => {
            old.signal_type != new.signal_type || old.amp_floor_log != new.amp_floor_log
        }
    };

    let reconciliation = Reconciliation {
        layout,
        reset_normalization: sample_size_changed || scaling_changed,
    };
    log::debug!(
        "Reconciled configuration: realloc={}, reset_normalization={}",
        reconciliation.layout.is_some(),
        reconciliation.reset_normalization
    );
    reconciliation
}
