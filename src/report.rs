//! JSON summaries of computed histograms.

use std::fs;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use log::warn;
use serde::Serialize;

use crate::error::{HistError, Result};
use crate::histogram::{BinRange, Histogram};
use crate::raster::Raster;

#[derive(Debug, Clone, Serialize)]
pub struct HistogramSummary {
    pub range: BinRange,
    pub total: u64,
    pub underflow: u64,
    pub overflow: u64,
    pub non_empty_bins: usize,
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub mean: Option<f64>,
    pub median: Option<i32>,
    pub peak_value: Option<i32>,
    pub peak_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<Vec<u64>>,
}

impl HistogramSummary {
    pub fn from_histogram(hist: &Histogram, include_counts: bool) -> Self {
        let peak = hist.peak();
        Self {
            range: hist.range(),
            total: hist.total(),
            underflow: hist.underflow(),
            overflow: hist.overflow(),
            non_empty_bins: hist.non_empty_bins(),
            min: hist.min_value(),
            max: hist.max_value(),
            mean: hist.mean(),
            median: hist.percentile(0.5),
            peak_value: peak.map(|(v, _)| v),
            peak_count: peak.map(|(_, c)| c),
            counts: include_counts.then(|| hist.counts().to_vec()),
        }
    }

    /// Single line suitable for terminal output.
    pub fn one_line(&self) -> String {
        let fmt_opt = |v: Option<i32>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
        format!(
            "range=[{}, {}) total={} outside={} bins_used={} min={} max={} mean={} median={} peak={}",
            self.range.lower(),
            self.range.upper(),
            self.total,
            self.underflow + self.overflow,
            self.non_empty_bins,
            fmt_opt(self.min),
            fmt_opt(self.max),
            self.mean.map_or_else(|| "-".to_string(), |m| format!("{m:.2}")),
            fmt_opt(self.median),
            match (self.peak_value, self.peak_count) {
                (Some(v), Some(c)) => format!("{v}x{c}"),
                _ => "-".to_string(),
            }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramReport {
    pub source: PathBuf,
    pub file_size: String,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub bit_depth: u32,
    pub max_val: u16,
    pub sample_count: usize,
    pub pooled: HistogramSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub per_channel: Vec<HistogramSummary>,
}

impl HistogramReport {
    pub fn new(
        source: &Path,
        raster: &Raster,
        pooled: &Histogram,
        per_channel: &[Histogram],
        include_counts: bool,
    ) -> Self {
        let file_size = fs::metadata(source)
            .map(|m| ByteSize(m.len()).to_string())
            .unwrap_or_else(|e| {
                warn!("cannot stat {}: {e}", source.display());
                "unknown".to_string()
            });
        Self {
            source: source.to_path_buf(),
            file_size,
            width: raster.width(),
            height: raster.height(),
            channels: raster.channels(),
            bit_depth: raster.bit_depth(),
            max_val: raster.max_val(),
            sample_count: raster.sample_count(),
            pooled: HistogramSummary::from_histogram(pooled, include_counts),
            per_channel: per_channel
                .iter()
                .map(|h| HistogramSummary::from_histogram(h, include_counts))
                .collect(),
        }
    }
}

/// Pretty-prints `value` as JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| HistError::io(parent, e))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|e| HistError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reflects_histogram() {
        let h = Histogram::compute([0, 1, 1, 5000], BinRange::default());
        let s = HistogramSummary::from_histogram(&h, false);
        assert_eq!(s.total, 4);
        assert_eq!(s.overflow, 1);
        assert_eq!(s.peak_value, Some(1));
        assert_eq!(s.peak_count, Some(2));
        assert_eq!(s.median, Some(1));
        assert!(s.counts.is_none());
        let line = s.one_line();
        assert!(line.contains("range=[0, 4096)"));
        assert!(line.contains("outside=1"));
        assert!(line.contains("peak=1x2"));
    }

    #[test]
    fn counts_are_serialized_only_on_request() {
        let h = Histogram::compute([2, 3], BinRange::new(0, 4).unwrap());
        let without = serde_json::to_value(HistogramSummary::from_histogram(&h, false)).unwrap();
        assert!(without.get("counts").is_none());
        let with = serde_json::to_value(HistogramSummary::from_histogram(&h, true)).unwrap();
        assert_eq!(with["counts"], serde_json::json!([0, 0, 1, 1]));
        assert_eq!(with["range"]["upper"], 4);
    }

    #[test]
    fn missing_source_reports_unknown_size() {
        let raster = Raster::new(1, 1, 1, 255, vec![3]).unwrap();
        let h = Histogram::of_raster(&raster, BinRange::default());
        let report = HistogramReport::new(Path::new("no/such/file.pgm"), &raster, &h, &[], false);
        assert_eq!(report.file_size, "unknown");
        assert_eq!(report.sample_count, 1);
    }
}
