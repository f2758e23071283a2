//! Mask scanning: find every pixel painted in one exact color

use std::path::Path;

use image::{GenericImageView, Pixel};
use tracing::debug;

use super::raster::Raster;
use super::types::{ColorRgb, PixelCoordinate, PixelSet, RegionMapError};

/// Collect the coordinates of all pixels whose RGB channels equal `target`.
///
/// Every pixel is visited exactly once, columns outermost (x, then y), so the
/// result order is stable for a given image. Alpha is ignored.
pub fn scan<I>(image: &I, target: ColorRgb) -> PixelSet
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    let mut pixels = PixelSet::new();

    for x in 0..width {
        for y in 0..height {
            if ColorRgb::of_pixel(&image.get_pixel(x, y)) == target {
                pixels.push(PixelCoordinate::new(x, y));
            }
        }
    }

    debug!(
        "Scanned {}x{} mask for {}: {} matching pixels",
        width,
        height,
        target,
        pixels.len()
    );

    pixels
}

/// Open the mask at `path` and scan it for `target`
pub fn scan_file(path: &Path, target: ColorRgb) -> Result<PixelSet, RegionMapError> {
    let raster = Raster::open(path)?;
    Ok(scan(&raster.image, target))
}
