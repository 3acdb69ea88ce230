//! Decoded raster held in memory at its native bit depth.

use crate::error::{HistError, Result};

/// Interleaved integer raster.
///
/// Samples are stored row-major with channels interleaved, so the sample for
/// `(row, col, channel)` lives at `(row * width + col) * channels + channel`.
/// Values are never rescaled: a 12-bit source keeps `max_val = 4095`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: usize,
    max_val: u16,
    samples: Vec<u16>,
}

impl Raster {
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        max_val: u16,
        samples: Vec<u16>,
    ) -> Result<Self> {
        if !(1..=4).contains(&channels) {
            return Err(HistError::InvalidRaster(format!(
                "channel count {channels} outside 1..=4"
            )));
        }
        if max_val == 0 {
            return Err(HistError::InvalidRaster("max_val must be positive".into()));
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| HistError::InvalidRaster("width*height*channels overflow".into()))?;
        if samples.len() != expected {
            return Err(HistError::InvalidRaster(format!(
                "expected {expected} samples for {width}x{height}x{channels}, got {}",
                samples.len()
            )));
        }
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| **v > max_val) {
            return Err(HistError::InvalidRaster(format!(
                "sample {value} at index {index} exceeds max_val {max_val}"
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            max_val,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn max_val(&self) -> u16 {
        self.max_val
    }

    /// Bits needed to represent `max_val` (12 for 4095, 8 for 255).
    pub fn bit_depth(&self) -> u32 {
        u16::BITS - self.max_val.leading_zeros()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    pub fn sample(&self, row: usize, col: usize, channel: usize) -> Option<u16> {
        if row >= self.height || col >= self.width || channel >= self.channels {
            return None;
        }
        self.samples
            .get((row * self.width + col) * self.channels + channel)
            .copied()
    }

    /// Every sample widened to `i32`, in storage order.
    pub fn samples_i32(&self) -> impl Iterator<Item = i32> + '_ {
        self.samples.iter().map(|&v| i32::from(v))
    }

    /// Samples of a single channel widened to `i32`. Empty if `channel` is out of range.
    pub fn channel_i32(&self, channel: usize) -> impl Iterator<Item = i32> + '_ {
        let take = if channel < self.channels {
            self.samples.len()
        } else {
            0
        };
        self.samples[..take]
            .iter()
            .skip(channel)
            .step_by(self.channels)
            .map(|&v| i32::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_2x2() -> Raster {
        // (r, g, b) per pixel
        let samples = vec![
            0, 1, 2, //
            10, 11, 12, //
            20, 21, 22, //
            4095, 4094, 4093,
        ];
        Raster::new(2, 2, 3, 4095, samples).expect("valid raster")
    }

    #[test]
    fn indexing_follows_row_major_interleaved_layout() {
        let r = rgb_2x2();
        assert_eq!(r.sample(0, 0, 0), Some(0));
        assert_eq!(r.sample(0, 1, 2), Some(12));
        assert_eq!(r.sample(1, 0, 1), Some(21));
        assert_eq!(r.sample(1, 1, 0), Some(4095));
        assert_eq!(r.sample(2, 0, 0), None);
        assert_eq!(r.sample(0, 0, 3), None);
    }

    #[test]
    fn bit_depth_from_max_val() {
        assert_eq!(rgb_2x2().bit_depth(), 12);
        let r8 = Raster::new(1, 1, 1, 255, vec![7]).unwrap();
        assert_eq!(r8.bit_depth(), 8);
        let r16 = Raster::new(1, 1, 1, u16::MAX, vec![7]).unwrap();
        assert_eq!(r16.bit_depth(), 16);
    }

    #[test]
    fn channel_iterator_strides_over_interleaved_samples() {
        let r = rgb_2x2();
        let green: Vec<i32> = r.channel_i32(1).collect();
        assert_eq!(green, vec![1, 11, 21, 4094]);
        assert_eq!(r.channel_i32(3).count(), 0);
        assert_eq!(r.samples_i32().count(), r.sample_count());
    }

    #[test]
    fn rejects_inconsistent_geometry() {
        assert!(Raster::new(2, 2, 1, 255, vec![0; 3]).is_err());
        assert!(Raster::new(1, 1, 0, 255, vec![]).is_err());
        assert!(Raster::new(1, 1, 5, 255, vec![0; 5]).is_err());
        assert!(Raster::new(1, 1, 1, 0, vec![0]).is_err());
    }

    #[test]
    fn rejects_samples_above_max_val() {
        let err = Raster::new(2, 1, 1, 4095, vec![1, 4096]).unwrap_err();
        assert!(err.to_string().contains("4096"));
    }
}
