//! Adaptive peak normalization
//!
//! Normalization is upward expansion over the full dynamic range, based on
//! measured signal peaks. One `(peak, expansion factor)` pair is kept per
//! monitored slot: a single slot for amplitudes, one per spectrum bin for
//! spectrum data (over the full resolution, not just the observed band).
//!
//! Invariant: `factor = CEILING / max(peak, MIN_PEAK)`. Peaks only rise while
//! calibrating and are held otherwise.
//!
//! # Example
//!
//! ```
//! use audio_sensor::preprocessing::normalization::PeakNormalizer;
//!
//! let mut normalizer = PeakNormalizer::scalar();
//! let clipping = normalizer.calibrate(0, 0.5);
//! assert!(!clipping);
//! assert!((normalizer.factor(0) - 1.98).abs() < 1e-5);
//! assert_eq!(normalizer.normalize(0, 0.6), 1.0);
//! ```

/// Normalization ceiling, expansion factor = ceiling / peak
pub const CEILING: f32 = 0.99;

/// Lower bound for measured peaks, keeps factors finite
pub const MIN_PEAK: f32 = 0.01;

/// Running peaks and expansion factors
#[derive(Debug, Clone, PartialEq)]
pub struct PeakNormalizer {
    peaks: Vec<f32>,
    factors: Vec<f32>,
}

impl PeakNormalizer {
    /// Normalizer with `len` slots in reset state
    pub fn new(len: usize) -> Self {
        Self {
            peaks: vec![MIN_PEAK; len],
            factors: vec![1.0; len],
        }
    }

    /// Single-slot normalizer for amplitudes
    pub fn scalar() -> Self {
        Self::new(1)
    }

    /// Rebuild peaks from previously measured expansion factors
    ///
    /// `peak = CEILING / factor` for factors above 1, `MIN_PEAK` otherwise.
    pub fn from_factors(factors: Vec<f32>) -> Self {
        let peaks = factors
            .iter()
            .map(|&f| if f > 1.0 { CEILING / f } else { MIN_PEAK })
            .collect();
        Self { peaks, factors }
    }

    /// Number of monitored slots
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Whether no slots are monitored
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Clear all peaks to `MIN_PEAK` and all factors to 1
    pub fn reset(&mut self) {
        self.peaks.iter_mut().for_each(|p| *p = MIN_PEAK);
        self.factors.iter_mut().for_each(|f| *f = 1.0);
    }

    /// Measured peak for `index`
    pub fn peak(&self, index: usize) -> f32 {
        self.peaks[index]
    }

    /// Expansion factor for `index`
    pub fn factor(&self, index: usize) -> f32 {
        self.factors[index]
    }

    /// All expansion factors
    pub fn factors(&self) -> &[f32] {
        &self.factors
    }

    /// All measured peaks
    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    /// Whether `scaled` would reach the ceiling under the current factor
    pub fn is_clipping(&self, index: usize, scaled: f32) -> bool {
        scaled * self.factors[index] >= 1.0
    }

    /// Record `scaled` as a peak candidate without touching the factor
    ///
    /// Returns the clipping check against the factor in effect before this
    /// step. Call [`update_factor`](Self::update_factor) once all of the
    /// step's values for `index` have been tracked.
    pub fn track(&mut self, index: usize, scaled: f32) -> bool {
        let clipping = self.is_clipping(index, scaled);
        self.peaks[index] = self.peaks[index].max(scaled);
        clipping
    }

    /// Recompute the factor for `index` from its peak
    pub fn update_factor(&mut self, index: usize) {
        self.factors[index] = CEILING / self.peaks[index].max(MIN_PEAK);
    }

    /// Track a single value and update the factor in one go
    pub fn calibrate(&mut self, index: usize, scaled: f32) -> bool {
        let clipping = self.track(index, scaled);
        self.update_factor(index);
        clipping
    }

    /// Expand `scaled` by the factor for `index`, clamped to `[0, 1]`
    pub fn normalize(&self, index: usize, scaled: f32) -> f32 {
        (scaled * self.factors[index]).clamp(0.0, 1.0)
    }
}
