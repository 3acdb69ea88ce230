use std::fs;
use std::path::Path;

use bytesize::ByteSize;
use image::DynamicImage;
use log::{debug, info};

use crate::error::{HistError, Result};
use crate::pnm;
use crate::raster::Raster;

/// Loads a raster from disk without changing its bit depth or channel layout.
///
/// Netpbm files are recognised by their magic number and decoded by
/// [`pnm::decode_pnm`]; everything else goes through `image`.
pub fn load_raster(path: &Path) -> Result<Raster> {
    let bytes = fs::read(path).map_err(|e| HistError::io(path, e))?;
    debug!("read {} ({})", path.display(), ByteSize(bytes.len() as u64));

    let raster = if pnm::is_pnm_magic(&bytes) {
        debug!("decoding {} as netpbm", path.display());
        pnm::decode_pnm(&bytes)?
    } else {
        debug!("decoding {} with the image crate", path.display());
        let img = image::load_from_memory(&bytes)?;
        raster_from_dynamic(img)?
    };

    info!(
        "loaded {}: {}x{}x{} at {} bits",
        path.display(),
        raster.width(),
        raster.height(),
        raster.channels(),
        raster.bit_depth()
    );
    Ok(raster)
}

/// Converts a decoded `image` buffer into a [`Raster`], keeping 8-bit sources
/// at `max_val = 255` and 16-bit sources at `max_val = 65535`.
///
/// Floating point buffers are quantised to 16 bits.
pub fn raster_from_dynamic(img: DynamicImage) -> Result<Raster> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let widen = |v: Vec<u8>| v.into_iter().map(u16::from).collect::<Vec<u16>>();

    match img {
        DynamicImage::ImageLuma8(buf) => Raster::new(w, h, 1, 255, widen(buf.into_raw())),
        DynamicImage::ImageLumaA8(buf) => Raster::new(w, h, 2, 255, widen(buf.into_raw())),
        DynamicImage::ImageRgb8(buf) => Raster::new(w, h, 3, 255, widen(buf.into_raw())),
        DynamicImage::ImageRgba8(buf) => Raster::new(w, h, 4, 255, widen(buf.into_raw())),
        DynamicImage::ImageLuma16(buf) => Raster::new(w, h, 1, u16::MAX, buf.into_raw()),
        DynamicImage::ImageLumaA16(buf) => Raster::new(w, h, 2, u16::MAX, buf.into_raw()),
        DynamicImage::ImageRgb16(buf) => Raster::new(w, h, 3, u16::MAX, buf.into_raw()),
        DynamicImage::ImageRgba16(buf) => Raster::new(w, h, 4, u16::MAX, buf.into_raw()),
        other => {
            if other.color().has_alpha() {
                Raster::new(w, h, 4, u16::MAX, other.into_rgba16().into_raw())
            } else {
                Raster::new(w, h, 3, u16::MAX, other.into_rgb16().into_raw())
            }
        }
    }
}
