//! regionmap library
//!
//! Turns a mask image with one uniform color per region into per-region
//! metafiles, and paints choropleth maps from those metafiles.

pub mod config;
pub mod region;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use region::{
    ColorRgb, Header, MetafileAuthor, PixelCoordinate, PixelSet, RegionAssignment, RegionMapError,
    RegionPainter,
};
