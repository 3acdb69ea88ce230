//! Error metrics between two rasters of identical geometry.

use serde::Serialize;

use crate::error::{HistError, Result};
use crate::raster::Raster;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelError {
    /// Mean squared error.
    pub mse: f64,
    /// Peak absolute error.
    pub pae: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub channels: Vec<ChannelError>,
    /// Over all channels, in dB relative to `max_val`. Infinite for identical rasters.
    pub psnr: f64,
    pub pae: u32,
}

fn check_geometry(a: &Raster, b: &Raster) -> Result<()> {
    let describe = |r: &Raster| {
        format!(
            "{}x{}x{} maxval {}",
            r.width(),
            r.height(),
            r.channels(),
            r.max_val()
        )
    };
    if a.width() != b.width()
        || a.height() != b.height()
        || a.channels() != b.channels()
        || a.max_val() != b.max_val()
    {
        return Err(HistError::Mismatch(format!(
            "{} vs {}",
            describe(a),
            describe(b)
        )));
    }
    Ok(())
}

pub fn compare(a: &Raster, b: &Raster) -> Result<Comparison> {
    check_geometry(a, b)?;

    let channels = a.channels();
    let mut sq = vec![0f64; channels];
    let mut pae = vec![0u32; channels];
    for (i, (&x, &y)) in a.samples().iter().zip(b.samples()).enumerate() {
        let c = i % channels;
        let err = u32::from(x.abs_diff(y));
        pae[c] = pae[c].max(err);
        sq[c] += f64::from(err) * f64::from(err);
    }

    let pixels = (a.width() * a.height()) as f64;
    let per_channel: Vec<ChannelError> = sq
        .iter()
        .zip(&pae)
        .map(|(&se, &pae)| ChannelError {
            mse: if pixels > 0.0 { se / pixels } else { 0.0 },
            pae,
        })
        .collect();

    let total_se: f64 = sq.iter().sum();
    let samples = a.sample_count() as f64;
    let peak = f64::from(a.max_val());
    let psnr = if total_se == 0.0 || samples == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (peak * peak / (total_se / samples)).log10()
    };

    Ok(Comparison {
        channels: per_channel,
        psnr,
        pae: pae.iter().copied().max().unwrap_or(0),
    })
}
