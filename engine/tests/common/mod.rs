//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use regionmap::ColorRgb;

pub const RED: ColorRgb = ColorRgb::new(255, 0, 0);
pub const GREEN: ColorRgb = ColorRgb::new(0, 255, 0);
pub const BLUE: ColorRgb = ColorRgb::new(0, 0, 255);
pub const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// 2x2 gray mask with (1, 1) = #ff0000
pub fn scenario_a_mask() -> RgbaImage {
    let mut mask = RgbaImage::from_pixel(2, 2, GRAY);
    mask.put_pixel(1, 1, RED.to_rgba());
    mask
}

/// 6x4 gray mask split into a red left block (x < 2) and a blue right block (x >= 4)
pub fn two_region_mask() -> RgbaImage {
    RgbaImage::from_fn(6, 4, |x, _| match x {
        0..=1 => RED.to_rgba(),
        4..=5 => BLUE.to_rgba(),
        _ => GRAY,
    })
}

/// Save `image` as PNG under `dir`
pub fn write_png(dir: &Path, name: &str, image: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).expect("Failed to write test PNG");
    path
}

/// Write raw metafile text under `dir`
pub fn write_raw_metafile(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write test metafile");
    path
}
