//! Temporal ring buffer backing the observation tensor
//!
//! Holds one grid of `width × height` cells per channel. Each sampling step
//! owns `signal_channels` consecutive channels, starting at
//! `step · signal_channels`; the step cursor cycles through the buffer length
//! so the channels form a sliding window over the most recent steps.
//!
//! Resetting the cursor at an episode boundary does not clear stored values.
//! Channels of later steps keep the previous episode's data until the window
//! has cycled once.

use crate::error::SensorError;
use crate::features::shape::ObservationShape;

/// Cyclic multi-channel sample buffer
#[derive(Debug, Clone)]
pub struct TemporalRingBuffer {
    shape: ObservationShape,
    /// Channel-major storage: `data[channel · area + position]`
    data: Vec<f32>,
    /// Sampling step the next `begin_step` is expected for
    step: usize,
    /// First channel written by the current step
    channel_offset: usize,
    /// Next write position within the current step's channel(s)
    position: usize,
}

impl TemporalRingBuffer {
    /// Zeroed buffer for `shape`
    pub fn new(shape: ObservationShape) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.len()],
            step: 0,
            channel_offset: 0,
            position: 0,
        }
    }

    /// Tensor shape
    pub fn shape(&self) -> ObservationShape {
        self.shape
    }

    /// Current step cursor, always below the buffer length
    pub fn current_step(&self) -> usize {
        self.step
    }

    /// Number of writes made since the last `begin_step`
    pub fn position(&self) -> usize {
        self.position
    }

    /// Direct samples to the channels of `step` and rewind the write cursor
    pub fn begin_step(&mut self, step: usize) -> Result<(), SensorError> {
        let buffer_length = self.shape.buffer_length();
        if step >= buffer_length {
            return Err(SensorError::OutOfBounds(format!(
                "step {} outside buffer length {}",
                step, buffer_length
            )));
        }
        self.channel_offset = step * self.shape.signal_channels;
        self.position = 0;
        Ok(())
    }

    fn next_index(&mut self) -> Result<usize, SensorError> {
        let area = self.shape.area();
        if self.position >= area {
            return Err(SensorError::OutOfBounds(format!(
                "write {} exceeds {} cells per channel",
                self.position + 1,
                area
            )));
        }
        let index = self.channel_offset * area + self.position;
        self.position += 1;
        Ok(index)
    }

    /// Write a mono sample at the cursor and advance it
    pub fn write_sample(&mut self, value: f32) -> Result<(), SensorError> {
        let index = self.next_index()?;
        self.data[index] = value;
        Ok(())
    }

    /// Write a left/right pair at the cursor and advance it
    pub fn write_sample_pair(&mut self, left: f32, right: f32) -> Result<(), SensorError> {
        if self.shape.signal_channels < 2 {
            return Err(SensorError::OutOfBounds(
                "stereo write into a mono buffer".to_string(),
            ));
        }
        let index = self.next_index()?;
        self.data[index] = left;
        self.data[index + self.shape.area()] = right;
        Ok(())
    }

    /// Advance the step cursor modulo the buffer length, returning the new step
    pub fn advance_step(&mut self) -> usize {
        self.step = (self.step + 1) % self.shape.buffer_length().max(1);
        self.step
    }

    /// Rewind the step cursor to 0 without clearing stored values
    pub fn reset_cursor(&mut self) {
        self.step = 0;
    }

    /// Zero every stored value
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Sample at `position` in `channel`; 0 for anything never written or out of range
    pub fn read(&self, channel: usize, position: usize) -> f32 {
        let area = self.shape.area();
        if channel >= self.shape.channels || position >= area {
            return 0.0;
        }
        self.data[channel * area + position]
    }

    /// Value at tensor coordinates `(row, col, channel)`
    pub fn get(&self, row: usize, col: usize, channel: usize) -> f32 {
        if col >= self.shape.width {
            return 0.0;
        }
        self.read(channel, row * self.shape.width + col)
    }

    /// All samples of `channel`
    pub fn channel(&self, channel: usize) -> &[f32] {
        let area = self.shape.area();
        if channel >= self.shape.channels {
            return &[];
        }
        &self.data[channel * area..(channel + 1) * area]
    }

    /// Write the buffer in `(height, width, channels)` row-major order
    ///
    /// Returns the number of values written.
    pub fn write_observation(&self, out: &mut [f32]) -> Result<usize, SensorError> {
        let len = self.shape.len();
        if out.len() < len {
            return Err(SensorError::InvalidInput(format!(
                "observation needs {} values, got {}",
                len,
                out.len()
            )));
        }
        let area = self.shape.area();
        let channels = self.shape.channels;
        for position in 0..area {
            for channel in 0..channels {
                out[position * channels + channel] = self.data[channel * area + position];
            }
        }
        Ok(len)
    }

    /// Owned copy of the buffer as an observation tensor
    pub fn to_tensor(&self) -> ObservationTensor {
        let mut data = vec![0.0; self.shape.len()];
        // Sized from the shape, cannot fail.
        let _ = self.write_observation(&mut data);
        ObservationTensor {
            shape: self.shape,
            data,
        }
    }
}

/// Read-only observation in `(height, width, channels)` row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTensor {
    shape: ObservationShape,
    data: Vec<f32>,
}

impl ObservationTensor {
    /// Tensor shape
    pub fn shape(&self) -> ObservationShape {
        self.shape
    }

    /// Flat values
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at `(row, col, channel)`
    pub fn get(&self, row: usize, col: usize, channel: usize) -> f32 {
        let s = self.shape;
        if row >= s.height || col >= s.width || channel >= s.channels {
            return 0.0;
        }
        self.data[(row * s.width + col) * s.channels + channel]
    }

    /// Consume into the flat values
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalType;

    fn mono_shape(samples: usize, steps: usize) -> ObservationShape {
        ObservationShape::new(samples, steps, SignalType::Mono)
    }

    #[test]
    fn test_unwritten_reads_zero() {
        let buffer = TemporalRingBuffer::new(mono_shape(9, 3));
        assert_eq!(buffer.read(2, 8), 0.0);
        assert_eq!(buffer.read(99, 0), 0.0);
        assert_eq!(buffer.read(0, 99), 0.0);
    }

    #[test]
    fn test_writes_land_in_step_channel() {
        let mut buffer = TemporalRingBuffer::new(mono_shape(4, 3));
        buffer.begin_step(1).unwrap();
        for i in 0..4 {
            buffer.write_sample(i as f32 * 0.1).unwrap();
        }
        assert_eq!(buffer.channel(0), &[0.0; 4]);
        assert!((buffer.read(1, 3) - 0.3).abs() < 1e-6);
        // (row 1, col 1) of a 2 x 2 grid is position 3.
        assert!((buffer.get(1, 1, 1) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_stereo_pairs_use_adjacent_channels() {
        let shape = ObservationShape::new(4, 2, SignalType::Stereo);
        let mut buffer = TemporalRingBuffer::new(shape);
        buffer.begin_step(1).unwrap();
        buffer.write_sample_pair(0.25, 0.75).unwrap();
        assert_eq!(buffer.read(2, 0), 0.25);
        assert_eq!(buffer.read(3, 0), 0.75);
        assert_eq!(buffer.read(0, 0), 0.0);
    }

    #[test]
    fn test_stereo_write_into_mono_fails() {
        let mut buffer = TemporalRingBuffer::new(mono_shape(4, 1));
        buffer.begin_step(0).unwrap();
        assert!(matches!(
            buffer.write_sample_pair(0.1, 0.2),
            Err(SensorError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_overflow_is_out_of_bounds() {
        // 5 samples -> 3 x 2 grid, one padding cell
        let mut buffer = TemporalRingBuffer::new(mono_shape(5, 1));
        buffer.begin_step(0).unwrap();
        for _ in 0..6 {
            buffer.write_sample(1.0).unwrap();
        }
        let result = buffer.write_sample(1.0);
        assert!(matches!(result, Err(SensorError::OutOfBounds(_))));
    }

    #[test]
    fn test_begin_step_out_of_range() {
        let mut buffer = TemporalRingBuffer::new(mono_shape(4, 2));
        assert!(buffer.begin_step(2).is_err());
        assert!(buffer.begin_step(1).is_ok());
    }

    #[test]
    fn test_step_cursor_cycles() {
        let mut buffer = TemporalRingBuffer::new(mono_shape(4, 3));
        assert_eq!(buffer.current_step(), 0);
        let steps: Vec<usize> = (0..3).map(|_| buffer.advance_step()).collect();
        assert_eq!(steps, vec![1, 2, 0]);
    }

    #[test]
    fn test_reset_cursor_keeps_values() {
        let mut buffer = TemporalRingBuffer::new(mono_shape(4, 2));
        for step in 0..2 {
            buffer.begin_step(step).unwrap();
            for _ in 0..4 {
                buffer.write_sample(0.5 + step as f32 * 0.25).unwrap();
            }
            buffer.advance_step();
        }
        buffer.advance_step();
        assert_eq!(buffer.current_step(), 1);

        buffer.reset_cursor();
        assert_eq!(buffer.current_step(), 0);
        assert_eq!(buffer.read(1, 0), 0.75, "stale data persists until overwritten");

        buffer.clear();
        assert_eq!(buffer.read(1, 0), 0.0);
    }

    #[test]
    fn test_tensor_layout() {
        let shape = ObservationShape::new(4, 1, SignalType::Stereo);
        let mut buffer = TemporalRingBuffer::new(shape);
        buffer.begin_step(0).unwrap();
        for i in 0..4 {
            buffer.write_sample_pair(i as f32, 10.0 + i as f32).unwrap();
        }

        let tensor = buffer.to_tensor();
        assert_eq!(tensor.as_slice(), &[0.0, 10.0, 1.0, 11.0, 2.0, 12.0, 3.0, 13.0]);
        assert_eq!(tensor.get(1, 0, 1), 12.0);
        assert_eq!(tensor.get(1, 0, 5), 0.0);

        let mut short = vec![0.0; 3];
        assert!(buffer.write_observation(&mut short).is_err());

        assert_eq!(tensor.shape(), shape);
        assert_eq!(tensor.into_vec().len(), 8);
    }
}
