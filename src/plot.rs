use std::path::Path;

use log::debug;
use plotters::prelude::*;
use serde::Deserialize;

use crate::error::{HistError, Result};
use crate::histogram::{CoarseBin, Histogram};

const CHANNEL_COLORS: [RGBColor; 4] = [
    RGBColor(200, 40, 40),
    RGBColor(40, 160, 60),
    RGBColor(40, 80, 210),
    RGBColor(120, 120, 120),
];

/// Rendering parameters for histogram plots.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    /// Plot `log10(1 + count)` instead of the raw count.
    pub log_scale: bool,
    pub bar_color: [u8; 3],
    pub background: [u8; 3],
    pub margin: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 512,
            log_scale: false,
            bar_color: [60, 110, 220],
            background: [255, 255, 255],
            margin: 12,
        }
    }
}

fn to_rgb(c: [u8; 3]) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

fn bar_height(count: u64, log_scale: bool) -> f64 {
    if log_scale {
        (1.0 + count as f64).log10()
    } else {
        count as f64
    }
}

/// Merges buckets until there are no more bars than horizontal pixels.
fn display_bins(hist: &Histogram, plot_width: u32) -> Vec<CoarseBin> {
    let buckets = hist.counts().len();
    let factor = buckets.div_ceil(plot_width.max(1) as usize).max(1);
    hist.coarsen(factor)
}

fn series_colors(n: usize, opts: &PlotOptions) -> Vec<RGBColor> {
    match n {
        1 => vec![to_rgb(opts.bar_color)],
        2 => vec![to_rgb(opts.bar_color), CHANNEL_COLORS[3]],
        _ => CHANNEL_COLORS.iter().copied().cycle().take(n).collect(),
    }
}

fn render_rgb(hists: &[&Histogram], opts: &PlotOptions) -> Result<Vec<u8>> {
    let (width, height) = (opts.width, opts.height);
    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| HistError::Plot("width*height overflow".into()))?;
    let mut rgb = vec![255u8; pixel_count * 3];
    if pixel_count == 0 || hists.is_empty() {
        return Ok(rgb);
    }

    let inner_width = width.saturating_sub(2 * opts.margin).max(1);
    let series: Vec<Vec<CoarseBin>> = hists.iter().map(|h| display_bins(h, inner_width)).collect();

    let x0 = hists.iter().map(|h| h.range().lower()).min().unwrap_or(0);
    let x1 = hists.iter().map(|h| h.range().upper()).max().unwrap_or(1);
    let y_max = series
        .iter()
        .flatten()
        .map(|b| bar_height(b.count, opts.log_scale))
        .fold(0.0f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

    debug!(
        "rendering {} series over [{x0}, {x1}) at {width}x{height}, y_max={y_max:.1}",
        series.len()
    );

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&to_rgb(opts.background))
            .map_err(|e| HistError::Plot(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(opts.margin)
            .build_cartesian_2d(f64::from(x0)..f64::from(x1), 0.0f64..y_max)
            .map_err(|e| HistError::Plot(e.to_string()))?;

        let overlay = series.len() > 1;
        for (bins, color) in series.iter().zip(series_colors(series.len(), opts)) {
            let style = if overlay {
                color.mix(0.5).filled()
            } else {
                color.filled()
            };
            chart
                .draw_series(bins.iter().filter(|b| b.count > 0).map(|b| {
                    Rectangle::new(
                        [
                            (f64::from(b.start), 0.0),
                            (f64::from(b.end), bar_height(b.count, opts.log_scale)),
                        ],
                        style,
                    )
                }))
                .map_err(|e| HistError::Plot(e.to_string()))?;
        }

        let axis = RGBColor(40, 40, 40);
        chart
            .draw_series([
                PathElement::new(vec![(f64::from(x0), 0.0), (f64::from(x1), 0.0)], axis),
                PathElement::new(vec![(f64::from(x0), 0.0), (f64::from(x0), y_max)], axis),
            ])
            .map_err(|e| HistError::Plot(e.to_string()))?;

        root.present().map_err(|e| HistError::Plot(e.to_string()))?;
    }

    Ok(rgb)
}

/// Renders one or more histograms into an in-memory RGBA buffer.
///
/// A single histogram is drawn with `opts.bar_color`; several are overlaid
/// with translucent per-channel colours (red, green, blue, grey).
pub fn render_histograms_rgba(hists: &[&Histogram], opts: &PlotOptions) -> Result<Vec<u8>> {
    let rgb = render_rgb(hists, opts)?;
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    Ok(rgba)
}

pub fn render_histogram_rgba(hist: &Histogram, opts: &PlotOptions) -> Result<Vec<u8>> {
    render_histograms_rgba(&[hist], opts)
}

/// Renders `hists` and writes the plot as a PNG (or any format `image` infers from `path`).
pub fn save_histogram_png(hists: &[&Histogram], opts: &PlotOptions, path: &Path) -> Result<()> {
    let rgb = render_rgb(hists, opts)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| HistError::io(parent, e))?;
    }
    image::save_buffer(path, &rgb, opts.width, opts.height, image::ColorType::Rgb8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::BinRange;

    fn small_opts() -> PlotOptions {
        PlotOptions {
            width: 64,
            height: 32,
            margin: 0,
            ..PlotOptions::default()
        }
    }

    #[test]
    fn buffer_has_rgba_geometry() {
        let h = Histogram::compute([1, 1, 2], BinRange::new(0, 4).unwrap());
        let opts = small_opts();
        let px = render_histogram_rgba(&h, &opts).unwrap();
        assert_eq!(px.len(), 64 * 32 * 4);
        assert!(px.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn bars_are_drawn_in_bar_color() {
        let h = Histogram::compute([0, 0, 0, 3], BinRange::new(0, 4).unwrap());
        let opts = small_opts();
        let px = render_histogram_rgba(&h, &opts).unwrap();
        let [r, g, b] = opts.bar_color;
        let bar_pixels = px
            .chunks_exact(4)
            .filter(|p| p[0] == r && p[1] == g && p[2] == b)
            .count();
        assert!(bar_pixels > 0, "no bar pixels rendered");
    }

    #[test]
    fn empty_histogram_renders_background_only() {
        let h = Histogram::compute(std::iter::empty(), BinRange::new(0, 4).unwrap());
        let opts = small_opts();
        let px = render_histogram_rgba(&h, &opts).unwrap();
        let [r, g, b] = opts.bar_color;
        assert!(!px.chunks_exact(4).any(|p| p[0] == r && p[1] == g && p[2] == b));
    }

    #[test]
    fn wide_histograms_are_merged_to_fit_the_plot() {
        let h = Histogram::compute(0..4096, BinRange::default());
        let bins = display_bins(&h, 1000);
        assert_eq!(bins.len(), 820);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u64>(), 4096);
    }

    #[test]
    fn log_scale_compresses_counts() {
        assert_eq!(bar_height(0, true), 0.0);
        assert!((bar_height(9, true) - 1.0).abs() < 1e-12);
        assert_eq!(bar_height(9, false), 9.0);
    }
}
