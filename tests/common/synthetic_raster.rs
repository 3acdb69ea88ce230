use raster_histogram::Raster;

/// 12-bit RGB ramp: red follows x, green follows y, blue is constant.
pub fn ramp_rgb12(width: usize, height: usize) -> Raster {
    assert!(width > 0 && height > 0, "image dimensions must be positive");

    let mut samples = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            samples.push(((x * 4095) / width.max(2).saturating_sub(1)).min(4095) as u16);
            samples.push(((y * 37) % 4096) as u16);
            samples.push(2048);
        }
    }
    Raster::new(width, height, 3, 4095, samples).expect("valid synthetic raster")
}

/// 8-bit greymap cycling through every byte value.
pub fn cycle_gray8(width: usize, height: usize) -> Raster {
    let samples = (0..width * height).map(|i| (i % 256) as u16).collect();
    Raster::new(width, height, 1, 255, samples).expect("valid synthetic raster")
}
