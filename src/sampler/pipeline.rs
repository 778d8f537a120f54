//! Per-step sampling pipeline
//!
//! Once per external tick the pipeline pulls raw samples from the capture
//! collaborator, rescales them against the decibel floor, optionally measures
//! peaks, normalizes, writes the result into the temporal ring buffer and
//! notifies observers.
//!
//! Algorithm per step:
//! 1. Return early unless sampling is enabled
//! 2. Fetch left/right arrays sized to the full monitored range
//! 3. Rescale → (calibrating) peak/factor update and clipping check →
//!    (normalize) clamp-normalize → write the observed range
//! 4. Advance the step cursor and notify observers
//!
//! # Example
//!
//! ```
//! use audio_sensor::{AudioSampler, BlockCapture, SamplingPipeline, SensorConfig, StepOutcome};
//!
//! let mut capture = BlockCapture::new(48000);
//! capture.push_mono(&vec![0.1f32; 4096]);
//!
//! let mut pipeline = SamplingPipeline::new(SensorConfig::default(), capture);
//! pipeline.set_sampling_enabled(true);
//!
//! match pipeline.step()? {
//!     StepOutcome::Sampled(report) => assert!(report.window_complete),
//!     other => panic!("unexpected {:?}", other),
//! }
//! # Ok::<(), audio_sensor::SensorError>(())
//! ```

use crate::analysis::calibration::CalibrationProfile;
use crate::analysis::result::{StepOutcome, StepReport};
use crate::config::{reconcile, Reconciliation, SampleType, SensorConfig, SignalType};
use crate::error::SensorError;
use crate::features::shape::{resolve_layout, ObservationShape, SensorLayout};
use crate::io::capture::AudioCapture;
use crate::io::sample_buffer::{ObservationTensor, TemporalRingBuffer};
use crate::preprocessing::channel_mixer::{lr_mean, rms_levels, signed_remap};
use crate::preprocessing::normalization::PeakNormalizer;
use crate::preprocessing::rescale::rescale;
use crate::sampler::observer::{AudioSampler, ObserverId, ObserverList, StepObserver};

/// Single-writer sampling pipeline owning the buffer and normalization state
pub struct SamplingPipeline<C: AudioCapture> {
    config: SensorConfig,
    capture: C,
    layout: SensorLayout,
    normalizer: PeakNormalizer,
    buffer: TemporalRingBuffer,
    samples_left: Vec<f32>,
    samples_right: Vec<f32>,
    sampling_enabled: bool,
    calibrating: bool,
    clipping: bool,
    observers: ObserverList,
}

impl<C: AudioCapture> std::fmt::Debug for SamplingPipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingPipeline")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .field("step", &self.buffer.current_step())
            .field("sampling_enabled", &self.sampling_enabled)
            .field("calibrating", &self.calibrating)
            .field("clipping", &self.clipping)
            .field("observers", &self.observers)
            .finish()
    }
}

fn normalizer_len(config: &SensorConfig) -> usize {
    match config.sample_type() {
        SampleType::Spectrum => config.fft_resolution(),
        SampleType::Amplitude => 1,
    }
}

impl<C: AudioCapture> SamplingPipeline<C> {
    /// Build a pipeline for `config` pulling from `capture`
    ///
    /// Sampling starts disabled and calibration inactive.
    pub fn new(config: SensorConfig, capture: C) -> Self {
        let config = config.validated();
        let layout = resolve_layout(&config, capture.sample_rate());
        let normalizer = PeakNormalizer::new(normalizer_len(&config));
        log::debug!(
            "Creating sampling pipeline '{}': {:?} {:?}, {}",
            config.sensor_name(),
            config.sample_type(),
            config.signal_type(),
            layout.shape
        );
        Self {
            buffer: TemporalRingBuffer::new(layout.shape),
            samples_left: vec![0.0; layout.capture_len],
            samples_right: vec![0.0; layout.capture_len],
            config,
            capture,
            layout,
            normalizer,
            sampling_enabled: false,
            calibrating: false,
            clipping: false,
            observers: ObserverList::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Name of the sensor
    pub fn sensor_name(&self) -> &str {
        self.config.sensor_name()
    }

    /// Replace the configuration between steps
    ///
    /// Reallocates the buffer when the layout changes (stored samples are
    /// lost) and resets normalization when the measured peaks no longer apply.
    pub fn apply_config(&mut self, config: SensorConfig) -> Reconciliation {
        let config = config.validated();
        let reconciliation = reconcile(&self.config, &config, self.capture.sample_rate());
        self.config = config;

        if let Some(layout) = reconciliation.layout {
            self.buffer = TemporalRingBuffer::new(layout.shape);
            self.samples_left = vec![0.0; layout.capture_len];
            self.samples_right = vec![0.0; layout.capture_len];
            self.layout = layout;
        }
        if reconciliation.reset_normalization
            || self.normalizer.len() != normalizer_len(&self.config)
        {
            self.reset_normalization();
        }
        reconciliation
    }

    /// Mutate a copy of the configuration and apply it
    pub fn update_config<F>(&mut self, update: F) -> Reconciliation
    where
        F: FnOnce(&mut SensorConfig),
    {
        let mut config = self.config.clone();
        update(&mut config);
        self.apply_config(config)
    }

    /// Resolved layout
    pub fn layout(&self) -> &SensorLayout {
        &self.layout
    }

    /// Observation tensor shape
    pub fn shape(&self) -> ObservationShape {
        self.layout.shape
    }

    /// Values written per channel each step
    pub fn samples_per_channel(&self) -> usize {
        self.layout.samples_per_channel
    }

    /// Borrow the capture collaborator
    pub fn capture(&self) -> &C {
        &self.capture
    }

    /// Mutably borrow the capture collaborator, e.g. to push audio
    pub fn capture_mut(&mut self) -> &mut C {
        &mut self.capture
    }

    /// Read-only access to the ring buffer
    pub fn buffer(&self) -> &TemporalRingBuffer {
        &self.buffer
    }

    /// Owned copy of the current observation
    pub fn observation(&self) -> ObservationTensor {
        self.buffer.to_tensor()
    }

    /// Write the current observation in `(height, width, channels)` order
    pub fn write_observation(&self, out: &mut [f32]) -> Result<usize, SensorError> {
        self.buffer.write_observation(out)
    }

    /// Enter or leave calibration
    ///
    /// Peaks are only measured while calibrating with normalization enabled.
    /// Leave this off for training.
    pub fn set_calibrating(&mut self, calibrating: bool) {
        self.calibrating = calibrating;
    }

    /// Whether the calibration flag is set
    pub fn is_calibrating(&self) -> bool {
        self.calibrating
    }

    /// Whether peaks are measured on the next step
    pub fn measures_peaks(&self) -> bool {
        self.config.normalize() && self.calibrating
    }

    /// Whether any value clipped during the latest step
    ///
    /// Expected while calibrating; it means more peaks need measuring.
    pub fn is_clipping(&self) -> bool {
        self.clipping
    }

    /// Expansion factor of spectrum bin `index` (or of the amplitude slot 0)
    pub fn expansion_factor(&self, index: usize) -> Option<f32> {
        self.normalizer.factors().get(index).copied()
    }

    /// Scalar expansion factor, when sampling amplitudes
    pub fn amplitude_expansion(&self) -> Option<f32> {
        match self.config.sample_type() {
            SampleType::Amplitude => self.expansion_factor(0),
            SampleType::Spectrum => None,
        }
    }

    /// All expansion factors
    pub fn expansion_factors(&self) -> &[f32] {
        self.normalizer.factors()
    }

    /// Clear measured peaks and expansion factors
    pub fn reset_normalization(&mut self) {
        log::info!(
            "Resetting normalization, sample type: {:?}",
            self.config.sample_type()
        );
        let len = normalizer_len(&self.config);
        if self.normalizer.len() == len {
            self.normalizer.reset();
        } else {
            self.normalizer = PeakNormalizer::new(len);
        }
    }

    /// Snapshot the current expansion factors
    pub fn calibration_profile(&self) -> CalibrationProfile {
        CalibrationProfile::capture(&self.config, &self.normalizer)
    }

    /// Restore expansion factors saved by [`calibration_profile`](Self::calibration_profile)
    pub fn restore_calibration(&mut self, profile: &CalibrationProfile) -> Result<(), SensorError> {
        profile.validate(&self.config)?;
        self.normalizer = profile.to_normalizer();
        log::info!(
            "Restored {} expansion factors for {:?}",
            self.normalizer.len(),
            profile.sample_type
        );
        Ok(())
    }

    /// Mean of the latest left and right raw sample at `index`
    pub fn lr_mean(&self, index: usize) -> Option<f32> {
        let left = self.samples_left.get(index)?;
        let right = self.samples_right.get(index)?;
        Some(lr_mean(*left, *right))
    }

    /// RMS level `[left, right]` of the latest raw batch
    ///
    /// Meant for amplitude sampling; mono reports the mean channel twice.
    pub fn rms_level(&self) -> [f32; 2] {
        rms_levels(
            &self.samples_left,
            &self.samples_right,
            self.layout.samples_per_channel,
            self.config.signal_type() == SignalType::Mono,
        )
    }

    /// Episode boundary: rewind the step cursor
    ///
    /// Stored samples are kept; later channels hold the previous episode's
    /// data until the window has cycled.
    pub fn reset(&mut self) {
        log::debug!("Resetting step cursor of '{}'", self.config.sensor_name());
        self.buffer.reset_cursor();
    }

    /// Sample one step
    ///
    /// A capture that cannot supply samples yields [`StepOutcome::Skipped`].
    /// Errors are defects such as a write count exceeding the buffer layout.
    pub fn step(&mut self) -> Result<StepOutcome, SensorError> {
        if !self.sampling_enabled {
            return Ok(StepOutcome::Disabled);
        }

        match self.acquire() {
            Ok(()) => {}
            Err(SensorError::CaptureUnavailable(msg)) => {
                log::warn!("Skipping sampling step: {}", msg);
                return Ok(StepOutcome::Skipped);
            }
            Err(e) => return Err(e),
        }

        let step_index = self.buffer.current_step();
        self.buffer.begin_step(step_index)?;
        self.clipping = false;

        let clipping = match (self.config.sample_type(), self.config.signal_type()) {
            (SampleType::Spectrum, SignalType::Mono) => self.sample_spectrum_mono()?,
            (SampleType::Spectrum, SignalType::Stereo) => self.sample_spectrum_stereo()?,
            (SampleType::Amplitude, SignalType::Mono) => self.sample_amplitude_mono()?,
            (SampleType::Amplitude, SignalType::Stereo) => self.sample_amplitude_stereo()?,
        };
        self.clipping = clipping;

        let window_complete = step_index == self.config.buffer_length() - 1;
        self.buffer.advance_step();

        log::debug!(
            "Sampled step {} (window complete: {}, clipping: {})",
            step_index,
            window_complete,
            clipping
        );
        self.observers.notify(step_index, window_complete, &self.buffer);

        Ok(StepOutcome::Sampled(StepReport {
            step_index,
            window_complete,
            clipping,
        }))
    }

    fn acquire(&mut self) -> Result<(), SensorError> {
        match self.config.sample_type() {
            SampleType::Spectrum => {
                let window = self.config.fft_window();
                self.capture.spectrum_data(&mut self.samples_left, 0, window)?;
                self.capture.spectrum_data(&mut self.samples_right, 1, window)
            }
            SampleType::Amplitude => {
                self.capture.output_data(&mut self.samples_left, 0)?;
                self.capture.output_data(&mut self.samples_right, 1)
            }
        }
    }

    fn observed_bins(&self) -> (usize, usize) {
        self.layout
            .bin_range
            .unwrap_or((0, self.layout.samples_per_channel - 1))
    }

    fn sample_spectrum_mono(&mut self) -> Result<bool, SensorError> {
        let floor = self.config.fft_floor_db();
        let normalize = self.config.normalize();
        let measure = self.measures_peaks();
        let (min_index, max_index) = self.observed_bins();

        let left = &self.samples_left;
        let right = &self.samples_right;
        let normalizer = &mut self.normalizer;
        let buffer = &mut self.buffer;

        let mut clipping = false;
        if measure {
            // Peaks are measured over all bins, not just the observed band.
            for (i, (&l, &r)) in left.iter().zip(right).enumerate() {
                clipping |= normalizer.calibrate(i, rescale(lr_mean(l, r), floor));
            }
        }

        let observed = left[min_index..=max_index]
            .iter()
            .zip(&right[min_index..=max_index]);
        for (i, (&l, &r)) in (min_index..).zip(observed) {
            let mut scaled = rescale(lr_mean(l, r), floor);
            if normalize {
                scaled = normalizer.normalize(i, scaled);
            }
            buffer.write_sample(scaled)?;
        }
        Ok(clipping)
    }

    fn sample_spectrum_stereo(&mut self) -> Result<bool, SensorError> {
        let floor = self.config.fft_floor_db();
        let normalize = self.config.normalize();
        let measure = self.measures_peaks();
        let (min_index, max_index) = self.observed_bins();

        let left = &self.samples_left;
        let right = &self.samples_right;
        let normalizer = &mut self.normalizer;
        let buffer = &mut self.buffer;

        let mut clipping = false;
        if measure {
            for (i, (&l, &r)) in left.iter().zip(right).enumerate() {
                clipping |= normalizer.track(i, rescale(l, floor));
                clipping |= normalizer.track(i, rescale(r, floor));
                normalizer.update_factor(i);
            }
        }

        let observed = left[min_index..=max_index]
            .iter()
            .zip(&right[min_index..=max_index]);
        for (i, (&l, &r)) in (min_index..).zip(observed) {
            let mut scaled_left = rescale(l, floor);
            let mut scaled_right = rescale(r, floor);
            if normalize {
                scaled_left = normalizer.normalize(i, scaled_left);
                scaled_right = normalizer.normalize(i, scaled_right);
            }
            buffer.write_sample_pair(scaled_left, scaled_right)?;
        }
        Ok(clipping)
    }

    fn sample_amplitude_mono(&mut self) -> Result<bool, SensorError> {
        let floor = self.config.amp_floor_db();
        let normalize = self.config.normalize();
        let measure = self.measures_peaks();
        let count = self.layout.samples_per_channel;

        let left = &self.samples_left[..count];
        let right = &self.samples_right[..count];
        let normalizer = &mut self.normalizer;
        let buffer = &mut self.buffer;

        let mut clipping = false;
        if measure {
            for (&l, &r) in left.iter().zip(right) {
                clipping |= normalizer.track(0, rescale(lr_mean(l, r), floor));
            }
            normalizer.update_factor(0);
        }

        for (&l, &r) in left.iter().zip(right) {
            // Mean can be negative, scaled never is.
            let mean = lr_mean(l, r);
            let mut scaled = rescale(mean, floor);
            if normalize {
                scaled = normalizer.normalize(0, scaled);
            }
            buffer.write_sample(signed_remap(scaled, mean))?;
        }
        Ok(clipping)
    }

    fn sample_amplitude_stereo(&mut self) -> Result<bool, SensorError> {
        let floor = self.config.amp_floor_db();
        let normalize = self.config.normalize();
        let measure = self.measures_peaks();
        let count = self.layout.samples_per_channel;

        let left = &self.samples_left[..count];
        let right = &self.samples_right[..count];
        let normalizer = &mut self.normalizer;
        let buffer = &mut self.buffer;

        let mut clipping = false;
        if measure {
            for (&l, &r) in left.iter().zip(right) {
                clipping |= normalizer.track(0, rescale(l, floor));
                clipping |= normalizer.track(0, rescale(r, floor));
            }
            normalizer.update_factor(0);
        }

        for (&l, &r) in left.iter().zip(right) {
            let mut scaled_left = rescale(l, floor);
            let mut scaled_right = rescale(r, floor);
            if normalize {
                scaled_left = normalizer.normalize(0, scaled_left);
                scaled_right = normalizer.normalize(0, scaled_right);
            }
            buffer.write_sample_pair(signed_remap(scaled_left, l), signed_remap(scaled_right, r))?;
        }
        Ok(clipping)
    }
}

impl<C: AudioCapture> AudioSampler for SamplingPipeline<C> {
    fn sampling_enabled(&self) -> bool {
        self.sampling_enabled
    }

    fn set_sampling_enabled(&mut self, enabled: bool) {
        self.sampling_enabled = enabled;
    }

    fn subscribe(&mut self, observer: Box<dyn StepObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }
}
