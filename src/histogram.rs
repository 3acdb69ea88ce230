//! Unit-width integer histograms over a fixed half-open domain.

use serde::Serialize;

use crate::error::{HistError, Result};
use crate::raster::Raster;

/// Default domain: every value a 12-bit sample can take.
pub const DEFAULT_UPPER: i32 = 4096;

/// Half-open integer domain `[lower, upper)` split into buckets `[i, i + 1)`.
///
/// Only constructible through [`BinRange::new`] or [`BinRange::for_bit_depth`],
/// so `upper > lower` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinRange {
    lower: i32,
    upper: i32,
}

impl Default for BinRange {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: DEFAULT_UPPER,
        }
    }
}

impl BinRange {
    pub fn new(lower: i32, upper: i32) -> Result<Self> {
        if upper <= lower {
            return Err(HistError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// `[0, 2^bits)`, the full value domain of an unsigned `bits`-bit sample.
    pub fn for_bit_depth(bits: u32) -> Self {
        let bits = bits.clamp(1, 30);
        Self {
            lower: 0,
            upper: 1 << bits,
        }
    }

    pub fn lower(&self) -> i32 {
        self.lower
    }

    pub fn upper(&self) -> i32 {
        self.upper
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        (i64::from(self.upper) - i64::from(self.lower)).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.upper <= self.lower
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.lower && value < self.upper
    }

    /// Index of the bucket holding `value`, if it lies inside the domain.
    pub fn bucket_of(&self, value: i32) -> Option<usize> {
        self.contains(value)
            .then(|| (i64::from(value) - i64::from(self.lower)) as usize)
    }
}

/// Merged run of adjacent unit buckets, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoarseBin {
    pub start: i32,
    pub end: i32,
    pub count: u64,
}

/// Sample counts per unit bucket plus tallies of samples that fell outside.
///
/// `counts.iter().sum() + underflow + overflow == total` always holds, so no
/// sample is ever dropped silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    range: BinRange,
    counts: Vec<u64>,
    underflow: u64,
    overflow: u64,
    total: u64,
}

impl Histogram {
    pub fn compute<I>(samples: I, range: BinRange) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut counts = vec![0u64; range.len()];
        let mut underflow = 0u64;
        let mut overflow = 0u64;
        let mut total = 0u64;

        for v in samples {
            total += 1;
            match range.bucket_of(v) {
                Some(idx) => counts[idx] += 1,
                None if v < range.lower => underflow += 1,
                None => overflow += 1,
            }
        }

        Self {
            range,
            counts,
            underflow,
            overflow,
            total,
        }
    }

    /// All channels pooled into one histogram.
    pub fn of_raster(raster: &Raster, range: BinRange) -> Self {
        Self::compute(raster.samples_i32(), range)
    }

    /// One histogram per channel, in channel order.
    pub fn per_channel(raster: &Raster, range: BinRange) -> Vec<Self> {
        (0..raster.channels())
            .map(|c| Self::compute(raster.channel_i32(c), range))
            .collect()
    }

    pub fn range(&self) -> BinRange {
        self.range
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn underflow(&self) -> u64 {
        self.underflow
    }

    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Every sample seen, inside or outside the domain.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn in_range_total(&self) -> u64 {
        self.total - self.underflow - self.overflow
    }

    /// True when no sample fell outside the domain.
    pub fn is_complete(&self) -> bool {
        self.underflow == 0 && self.overflow == 0
    }

    /// Bucket boundaries `lower..=upper`; one more entry than `counts`.
    pub fn edges(&self) -> Vec<i32> {
        (self.range.lower..=self.range.upper).collect()
    }

    pub fn count(&self, value: i32) -> u64 {
        self.range
            .bucket_of(value)
            .map_or(0, |idx| self.counts[idx])
    }

    fn value_at(&self, idx: usize) -> i32 {
        (i64::from(self.range.lower) + idx as i64) as i32
    }

    pub fn non_empty_bins(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Lowest value with the highest count.
    pub fn peak(&self) -> Option<(i32, u64)> {
        let mut best: Option<(usize, u64)> = None;
        for (idx, &c) in self.counts.iter().enumerate() {
            if c > 0 && best.is_none_or(|(_, b)| c > b) {
                best = Some((idx, c));
            }
        }
        best.map(|(idx, c)| (self.value_at(idx), c))
    }

    pub fn min_value(&self) -> Option<i32> {
        self.counts
            .iter()
            .position(|&c| c > 0)
            .map(|idx| self.value_at(idx))
    }

    pub fn max_value(&self) -> Option<i32> {
        self.counts
            .iter()
            .rposition(|&c| c > 0)
            .map(|idx| self.value_at(idx))
    }

    /// Mean over in-range samples.
    pub fn mean(&self) -> Option<f64> {
        let n = self.in_range_total();
        if n == 0 {
            return None;
        }
        let sum: f64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(idx, &c)| f64::from(self.value_at(idx)) * c as f64)
            .sum();
        Some(sum / n as f64)
    }

    /// Smallest value whose cumulative in-range count reaches fraction `p`.
    pub fn percentile(&self, p: f64) -> Option<i32> {
        let n = self.in_range_total();
        if n == 0 || !(0.0..=1.0).contains(&p) {
            return None;
        }
        let target = ((p * n as f64).ceil() as u64).max(1);
        let mut seen = 0u64;
        for (idx, &c) in self.counts.iter().enumerate() {
            seen += c;
            if seen >= target {
                return Some(self.value_at(idx));
            }
        }
        None
    }

    /// Merges runs of `factor` adjacent buckets. The last run may be narrower.
    pub fn coarsen(&self, factor: usize) -> Vec<CoarseBin> {
        let factor = factor.max(1);
        self.counts
            .chunks(factor)
            .enumerate()
            .map(|(i, chunk)| {
                let start = self.value_at(i * factor);
                CoarseBin {
                    start,
                    end: start + chunk.len() as i32,
                    count: chunk.iter().sum(),
                }
            })
            .collect()
    }
}
