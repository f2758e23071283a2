//! Test Utilities Module
//!
//! Image fixtures shared by the unit tests. Only compiled when running tests.

#![cfg(test)]

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::region::ColorRgb;

pub const RED: ColorRgb = ColorRgb::new(255, 0, 0);
pub const GRAY: ColorRgb = ColorRgb::new(128, 128, 128);

/// 2x2 gray mask with a single red pixel at (1, 1)
pub fn scenario_mask() -> RgbaImage {
    let mut mask = RgbaImage::from_pixel(2, 2, GRAY.to_rgba());
    mask.put_pixel(1, 1, RED.to_rgba());
    mask
}

/// Uniform gray mask
pub fn gray_mask(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, GRAY.to_rgba())
}

/// White where x + y is even, black elsewhere
pub fn checker_mask(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

/// Save `image` as PNG under `dir` and return its path
pub fn write_png(dir: &Path, name: &str, image: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).expect("Failed to write test PNG");
    path
}
