//! Channel mixing and metering utilities

/// Mean of left and right, can be negative for amplitudes
#[inline]
pub fn lr_mean(left: f32, right: f32) -> f32 {
    (left + right) * 0.5
}

/// Sign with `sign(0) = +1`
#[inline]
pub fn sign(value: f32) -> f32 {
    if value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Map a scaled magnitude back onto the signed amplitude's half of `[0, 1]`
///
/// `0.5 + scaled · 0.5 · sign(amplitude)`: silence sits at 0.5, full-scale
/// positive samples at 1.0 and full-scale negative samples at 0.0.
#[inline]
pub fn signed_remap(scaled: f32, amplitude: f32) -> f32 {
    0.5 + scaled * 0.5 * sign(amplitude)
}

/// Root mean square of the first `len` samples
pub fn rms(samples: &[f32], len: usize) -> f32 {
    let len = len.min(samples.len());
    if len == 0 {
        return 0.0;
    }
    let sum: f32 = samples[..len].iter().map(|&x| x * x).sum();
    (sum / len as f32).sqrt()
}

/// RMS level of the first `len` left/right samples
///
/// With `mono` set, the level of the left/right mean is returned for both
/// channels. Individual clipping samples hardly show up here since large
/// batches average them out.
pub fn rms_levels(left: &[f32], right: &[f32], len: usize, mono: bool) -> [f32; 2] {
    if mono {
        let len = len.min(left.len()).min(right.len());
        if len == 0 {
            return [0.0, 0.0];
        }
        let sum: f32 = left[..len]
            .iter()
            .zip(&right[..len])
            .map(|(&l, &r)| {
                let mean = lr_mean(l, r);
                mean * mean
            })
            .sum();
        let level = (sum / len as f32).sqrt();
        [level, level]
    } else {
        [rms(left, len), rms(right, len)]
    }
}
