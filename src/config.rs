use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HistError, Result};
use crate::histogram::{BinRange, DEFAULT_UPPER};
use crate::plot::PlotOptions;

/// Settings for a histogram run. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistConfig {
    pub range: RangeConfig,
    pub per_channel: bool,
    pub plot: PlotConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub lower: i32,
    /// `null` derives the bound from the source bit depth.
    pub upper: Option<i32>,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: Some(DEFAULT_UPPER),
        }
    }
}

impl RangeConfig {
    pub fn resolve(&self, bit_depth: u32) -> Result<BinRange> {
        match self.upper {
            Some(upper) => BinRange::new(self.lower, upper),
            None => {
                let full = BinRange::for_bit_depth(bit_depth);
                BinRange::new(self.lower, full.upper())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    pub output: PathBuf,
    #[serde(flatten)]
    pub options: PlotOptions,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output: PathBuf::from("histogram.png"),
            options: PlotOptions::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output: Option<PathBuf>,
    pub include_counts: bool,
}

/// Command-line values layered over a loaded [`HistConfig`].
///
/// `None`/`false` leave the file value untouched; boolean switches can only
/// turn a setting on.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub lower: Option<i32>,
    pub upper: Option<i32>,
    pub auto_range: bool,
    pub per_channel: bool,
    pub log_scale: bool,
    pub plot: Option<PathBuf>,
    pub no_plot: bool,
    pub json: Option<PathBuf>,
    pub counts: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl HistConfig {
    pub fn apply_overrides(&mut self, o: &Overrides) {
        if let Some(lower) = o.lower {
            self.range.lower = lower;
        }
        if o.auto_range {
            self.range.upper = None;
        } else if let Some(upper) = o.upper {
            self.range.upper = Some(upper);
        }
        self.per_channel |= o.per_channel;
        self.plot.options.log_scale |= o.log_scale;
        if let Some(plot) = &o.plot {
            self.plot.output = plot.clone();
            self.plot.enabled = true;
        }
        if o.no_plot {
            self.plot.enabled = false;
        }
        if let Some(w) = o.width {
            self.plot.options.width = w;
        }
        if let Some(h) = o.height {
            self.plot.options.height = h;
        }
        if let Some(json) = &o.json {
            self.report.output = Some(json.clone());
        }
        self.report.include_counts |= o.counts;
    }
}

pub fn parse_config(text: &str) -> Result<HistConfig> {
    serde_json::from_str(text).map_err(|e| HistError::Config(e.to_string()))
}

pub fn load_config(path: &Path) -> Result<HistConfig> {
    let data = fs::read_to_string(path)
        .map_err(|e| HistError::Config(format!("Failed to read config {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| HistError::Config(format!("Failed to parse config {}: {e}", path.display())))
}
