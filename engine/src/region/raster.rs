//! Thin wrapper over the image codec: open a raster keeping its encoding, save it back

use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::debug;

use super::types::RegionMapError;

/// A decoded raster together with the encoding it was read from
pub struct Raster {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

impl Raster {
    /// Open and decode a raster file.
    ///
    /// The format is sniffed from the file content, falling back to the extension.
    pub fn open(path: &Path) -> Result<Self, RegionMapError> {
        let reader = ImageReader::open(path)
            .map_err(|e| RegionMapError::from_io(e, path))?
            .with_guessed_format()
            .map_err(|e| RegionMapError::from_io(e, path))?;

        let format = match reader.format() {
            Some(format) => format,
            None => {
                ImageFormat::from_path(path).map_err(|e| RegionMapError::from_image(e, path))?
            }
        };

        let image = reader
            .decode()
            .map_err(|e| RegionMapError::from_image(e, path))?;

        debug!(
            "Opened raster {:?}: {}x{} {:?} ({:?})",
            path,
            image.width(),
            image.height(),
            image.color(),
            format
        );

        Ok(Self { image, format })
    }

    /// Convert into an 8-bit canvas that can take full-opacity RGB writes.
    ///
    /// RGB and RGBA layouts are kept as-is; other layouts become RGBA when
    /// they carry alpha and RGB otherwise, so the source encoder still accepts them.
    pub fn into_canvas(self) -> (DynamicImage, ImageFormat) {
        let canvas = match self.image {
            image @ (DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)) => image,
            other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.into_rgba8()),
            other => DynamicImage::ImageRgb8(other.into_rgb8()),
        };
        (canvas, self.format)
    }
}

/// Encode `image` to `path` with an explicit format
pub fn save(image: &DynamicImage, path: &Path, format: ImageFormat) -> Result<(), RegionMapError> {
    image
        .save_with_format(path, format)
        .map_err(|e| RegionMapError::from_image(e, path))
}
